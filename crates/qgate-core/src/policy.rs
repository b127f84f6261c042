//! Sensitivity policy: which tables are exposed and how their columns are
//! hidden or redacted.
//!
//! The policy is authored by an operator in YAML:
//!
//! ```yaml
//! source_schema: public
//! tables:
//!   candidates:
//!     row_filter: "deleted_at IS NULL"
//!     columns:
//!       email: { omit: true }
//!       cpf: { rewrite: hash }
//!   departments: {}
//! ```
//!
//! The keys of `tables` form the allow-list. Columns without a rule are
//! exposed unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::ident::is_plain_identifier;

/// How a visible-but-sensitive column is rewritten inside its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewriteRule {
    /// Replace every value with NULL (typed). A bare `null` is YAML's null,
    /// so policies write `nullify` or `"null"`.
    #[serde(alias = "nullify")]
    Null,
    /// md5 digest of the textual value; preserves equality joins.
    Hash,
    /// Fixed mask for non-null values.
    Mask,
}

impl std::fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewriteRule::Null => write!(f, "null"),
            RewriteRule::Hash => write!(f, "hash"),
            RewriteRule::Mask => write!(f, "mask"),
        }
    }
}

/// Per-column decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ColumnRule {
    /// Drop the column from the view entirely.
    #[serde(default)]
    pub omit: bool,

    /// Keep the column but rewrite its values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<RewriteRule>,
}

impl ColumnRule {
    pub fn omit() -> Self {
        Self {
            omit: true,
            rewrite: None,
        }
    }

    pub fn rewrite(rule: RewriteRule) -> Self {
        Self {
            omit: false,
            rewrite: Some(rule),
        }
    }
}

/// Per-table policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TablePolicy {
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnRule>,

    /// Operator-authored predicate restricting the rows the view projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_filter: Option<String>,
}

/// Errors raised while loading or checking a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("policy allow-list is empty")]
    EmptyAllowList,

    #[error("invalid identifier '{0}' in policy")]
    InvalidIdentifier(String),

    #[error("invalid rule for {table}.{column}: {reason}")]
    InvalidRule {
        table: String,
        column: String,
        reason: String,
    },
}

/// The operator's sensitivity policy. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityPolicy {
    /// Schema holding the real tables.
    #[serde(default = "default_source_schema")]
    pub source_schema: String,

    /// Allow-listed tables.
    #[serde(default)]
    pub tables: BTreeMap<String, TablePolicy>,
}

impl Default for SensitivityPolicy {
    fn default() -> Self {
        Self {
            source_schema: default_source_schema(),
            tables: BTreeMap::new(),
        }
    }
}

fn default_source_schema() -> String {
    "public".to_string()
}

impl SensitivityPolicy {
    /// Load a policy from a YAML file and check it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a policy from YAML content and check it.
    pub fn from_yaml(content: &str) -> Result<Self, PolicyError> {
        let policy: Self = serde_yaml::from_str(content)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Structural checks that do not need the live schema.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if !is_plain_identifier(&self.source_schema) {
            return Err(PolicyError::InvalidIdentifier(self.source_schema.clone()));
        }
        if self.tables.is_empty() {
            return Err(PolicyError::EmptyAllowList);
        }
        for (table, table_policy) in &self.tables {
            if !is_plain_identifier(table) {
                return Err(PolicyError::InvalidIdentifier(table.clone()));
            }
            for (column, rule) in &table_policy.columns {
                if !is_plain_identifier(column) {
                    return Err(PolicyError::InvalidIdentifier(column.clone()));
                }
                if rule.omit && rule.rewrite.is_some() {
                    return Err(PolicyError::InvalidRule {
                        table: table.clone(),
                        column: column.clone(),
                        reason: "a column cannot be both omitted and rewritten".to_string(),
                    });
                }
                if !rule.omit && rule.rewrite.is_none() {
                    return Err(PolicyError::InvalidRule {
                        table: table.clone(),
                        column: column.clone(),
                        reason: "rule must either omit or rewrite the column".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Allow-listed table names, sorted.
    pub fn allowed_tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|t| t.as_str())
    }

    pub fn table(&self, table: &str) -> Option<&TablePolicy> {
        self.tables.get(table)
    }

    pub fn rule(&self, table: &str, column: &str) -> Option<&ColumnRule> {
        self.tables.get(table).and_then(|t| t.columns.get(column))
    }

    pub fn is_omitted(&self, table: &str, column: &str) -> bool {
        self.rule(table, column).map(|r| r.omit).unwrap_or(false)
    }
}
