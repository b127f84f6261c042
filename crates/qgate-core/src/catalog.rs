//! Catalog types describing the sandboxed surface.
//!
//! A [`Catalog`] lists the views of the safe schema. It is the single source
//! of truth for the validator's object-scope check and is what external query
//! generators receive (as a [`CatalogDocument`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::policy::RewriteRule;

/// Identifies the outbound document layout.
pub const CATALOG_FORMAT: &str = "qgate.catalog/v1";

/// Access modes a catalog entry grants. Only reads exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
}

/// `schema.name` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub schema: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// One exposed column of a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    /// Flagged by the sensitivity policy (visible but rewritten).
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<RewriteRule>,
    /// Column comment from the source table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Target of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

/// Foreign-key style relationship between two exposed views.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relationship {
    pub column: String,
    pub references: ColumnRef,
}

/// One view in the safe schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Safe schema holding the view.
    pub schema: String,
    /// View name.
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    /// Primary key columns, present only when every one is exposed unmodified.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Table comment from the source table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub access: BTreeSet<AccessMode>,
    /// Real table the view projects. Never part of the outbound document.
    pub source: QualifiedName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_filter: Option<String>,
}

impl CatalogEntry {
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(&self.schema, &self.name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn exposes(&self, column: &str) -> bool {
        self.column(column).is_some()
    }
}

/// Versioned snapshot of the safe schema's surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Content tag: identical inputs produce an identical version.
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub safe_schema: String,
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog, sorting entries and computing the version tag.
    pub fn new(safe_schema: impl Into<String>, mut entries: Vec<CatalogEntry>) -> Self {
        let safe_schema = safe_schema.into();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let schema_version = Self::compute_version(&safe_schema, &entries);
        Self {
            schema_version,
            generated_at: Utc::now(),
            safe_schema,
            entries,
        }
    }

    /// UUIDv5 over the canonical JSON of the entry list.
    pub fn compute_version(safe_schema: &str, entries: &[CatalogEntry]) -> String {
        let canonical = serde_json::to_vec(&(safe_schema, entries)).unwrap_or_default();
        Uuid::new_v5(&Uuid::NAMESPACE_OID, &canonical).to_string()
    }

    pub fn entry(&self, view: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == view)
    }

    /// Whether `schema.name` (or bare `name`) is an exposed view.
    ///
    /// A bare name resolves against the safe schema, which is the
    /// restricted principal's only search path entry.
    pub fn contains_relation(&self, schema: Option<&str>, name: &str) -> bool {
        if let Some(schema) = schema
            && schema != self.safe_schema
        {
            return false;
        }
        self.entry(name).is_some()
    }

    pub fn view_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// The outbound document handed to query generators.
    pub fn document(&self) -> CatalogDocument {
        CatalogDocument {
            format: CATALOG_FORMAT.to_string(),
            schema_version: self.schema_version.clone(),
            schema: self.safe_schema.clone(),
            tables: self
                .entries
                .iter()
                .map(|e| DocumentTable {
                    table: e.name.clone(),
                    comment: e.comment.clone(),
                    columns: e
                        .columns
                        .iter()
                        .map(|c| DocumentColumn {
                            name: c.name.clone(),
                            data_type: c.data_type.clone(),
                            nullable: c.nullable,
                            redacted: c.rewrite.is_some(),
                            comment: c.comment.clone(),
                        })
                        .collect(),
                    primary_key: e.primary_key.clone(),
                    relationships: e.relationships.clone(),
                })
                .collect(),
        }
    }
}

/// Stable outbound representation of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub format: String,
    pub schema_version: String,
    pub schema: String,
    pub tables: Vec<DocumentTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTable {
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub columns: Vec<DocumentColumn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub redacted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> CatalogEntry {
        CatalogEntry {
            schema: "gateway_safe".to_string(),
            name: name.to_string(),
            columns: vec![
                ColumnDescriptor {
                    name: "id".to_string(),
                    data_type: "integer".to_string(),
                    nullable: false,
                    sensitive: false,
                    rewrite: None,
                    comment: Some("surrogate key".to_string()),
                },
                ColumnDescriptor {
                    name: "cpf".to_string(),
                    data_type: "text".to_string(),
                    nullable: true,
                    sensitive: true,
                    rewrite: Some(RewriteRule::Hash),
                    comment: None,
                },
            ],
            primary_key: vec!["id".to_string()],
            relationships: vec![],
            comment: Some("Job applicants".to_string()),
            access: BTreeSet::from([AccessMode::Read]),
            source: QualifiedName::new("public", name.trim_end_matches("_safe")),
            row_filter: None,
        }
    }

    #[test]
    fn version_is_deterministic_and_content_sensitive() {
        let a = Catalog::new("gateway_safe", vec![entry("b_safe"), entry("a_safe")]);
        let b = Catalog::new("gateway_safe", vec![entry("a_safe"), entry("b_safe")]);
        assert_eq!(a.schema_version, b.schema_version);
        assert_eq!(a.view_names().collect::<Vec<_>>(), vec!["a_safe", "b_safe"]);

        let c = Catalog::new("gateway_safe", vec![entry("a_safe")]);
        assert_ne!(a.schema_version, c.schema_version);
    }

    #[test]
    fn contains_relation_respects_safe_schema() {
        let catalog = Catalog::new("gateway_safe", vec![entry("candidates_safe")]);
        assert!(catalog.contains_relation(None, "candidates_safe"));
        assert!(catalog.contains_relation(Some("gateway_safe"), "candidates_safe"));
        assert!(!catalog.contains_relation(Some("public"), "candidates_safe"));
        assert!(!catalog.contains_relation(None, "candidates"));
    }

    #[test]
    fn document_hides_source_tables() {
        let catalog = Catalog::new("gateway_safe", vec![entry("candidates_safe")]);
        let json = serde_json::to_value(catalog.document()).unwrap();
        let text = json.to_string();
        assert!(!text.contains("\"source\""));
        assert_eq!(json["tables"][0]["table"], "candidates_safe");
        assert_eq!(json["tables"][0]["columns"][0]["type"], "integer");
        assert!(json["tables"][0]["columns"][0].get("redacted").is_none());
        assert_eq!(json["tables"][0]["columns"][1]["redacted"], true);
    }

    #[test]
    fn document_carries_keys_and_comments() {
        let catalog = Catalog::new("gateway_safe", vec![entry("candidates_safe")]);
        let json = serde_json::to_value(catalog.document()).unwrap();
        let table = &json["tables"][0];
        assert_eq!(table["primary_key"], serde_json::json!(["id"]));
        assert_eq!(table["comment"], "Job applicants");
        assert_eq!(table["columns"][0]["comment"], "surrogate key");
        assert!(table["columns"][1].get("comment").is_none());
    }

    #[test]
    fn catalog_json_round_trip_keeps_version() {
        let catalog = Catalog::new("gateway_safe", vec![entry("candidates_safe")]);
        let parsed = Catalog::from_json(&catalog.to_json().unwrap()).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn document_validates_against_schema() {
        let catalog = Catalog::new("gateway_safe", vec![entry("candidates_safe")]);
        let instance = serde_json::to_value(catalog.document()).expect("document must serialize");
        let schema: serde_json::Value = serde_json::from_str(include_str!(
            "../../../schemas/CatalogDocument.schema.json"
        ))
        .expect("schema must parse");

        let validator = jsonschema::draft202012::options()
            .build(&schema)
            .expect("schema must compile");

        if !validator.is_valid(&instance) {
            let mut msgs = Vec::new();
            for (idx, err) in validator.iter_errors(&instance).take(20).enumerate() {
                msgs.push(format!("{}: {}", idx + 1, err));
            }
            panic!("catalog document did not validate: {}", msgs.join("; "));
        }
    }
}
