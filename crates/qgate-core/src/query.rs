//! Request/verdict/result types that flow through the gateway.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Who produced a candidate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuerySource {
    #[default]
    ModelGenerated,
    Manual,
}

/// An unvalidated SQL string plus request metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateQuery {
    pub sql: String,
    #[serde(default)]
    pub source: QuerySource,
    /// Row count the caller asked for; never raises the configured maximum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_limit: Option<u64>,
}

impl CandidateQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            source: QuerySource::ModelGenerated,
            requested_limit: None,
        }
    }

    pub fn manual(sql: impl Into<String>) -> Self {
        Self {
            source: QuerySource::Manual,
            ..Self::new(sql)
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.requested_limit = Some(limit);
        self
    }
}

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// Not exactly one SELECT statement.
    NotASelect,
    /// References a relation outside the safe schema catalog.
    UnauthorizedObject,
    /// Contains a data-modification or administrative keyword/function.
    ForbiddenKeyword,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::NotASelect => "not_a_select",
            RejectionKind::UnauthorizedObject => "unauthorized_object",
            RejectionKind::ForbiddenKeyword => "forbidden_keyword",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured rejection with a reason suitable for a regenerate loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub reason: String,
}

impl Rejection {
    pub fn new(kind: RejectionKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn not_a_select(reason: impl Into<String>) -> Self {
        Self::new(RejectionKind::NotASelect, reason)
    }

    pub fn unauthorized_object(reason: impl Into<String>) -> Self {
        Self::new(RejectionKind::UnauthorizedObject, reason)
    }

    pub fn forbidden_keyword(reason: impl Into<String>) -> Self {
        Self::new(RejectionKind::ForbiddenKeyword, reason)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.reason)
    }
}

/// Outcome of validating a candidate. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    normalized_sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection: Option<Rejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    row_ceiling: Option<u64>,
    catalog_version: String,
    source: QuerySource,
}

impl ValidationVerdict {
    /// Accepted verdict carrying the exact text to execute.
    pub fn accept(
        normalized_sql: String,
        row_ceiling: u64,
        catalog_version: impl Into<String>,
        source: QuerySource,
    ) -> Self {
        Self {
            accepted: true,
            normalized_sql: Some(normalized_sql),
            rejection: None,
            row_ceiling: Some(row_ceiling),
            catalog_version: catalog_version.into(),
            source,
        }
    }

    pub fn reject(
        rejection: Rejection,
        catalog_version: impl Into<String>,
        source: QuerySource,
    ) -> Self {
        Self {
            accepted: false,
            normalized_sql: None,
            rejection: Some(rejection),
            row_ceiling: None,
            catalog_version: catalog_version.into(),
            source,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn normalized_sql(&self) -> Option<&str> {
        self.normalized_sql.as_deref()
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }

    /// Row ceiling present in the normalized SQL.
    pub fn row_ceiling(&self) -> Option<u64> {
        self.row_ceiling
    }

    /// Catalog version the candidate was validated against.
    pub fn catalog_version(&self) -> &str {
        &self.catalog_version
    }

    pub fn source(&self) -> QuerySource {
        self.source
    }
}

/// Rows returned by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// One ordered column → value map per row.
    pub rows: Vec<Map<String, Value>>,
    pub row_count: u64,
    /// True when the enforced row ceiling was hit.
    pub truncated: bool,
    pub duration_ms: u64,
}
