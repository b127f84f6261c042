//! Catalog construction from a live schema and a sensitivity policy.

use std::collections::BTreeSet;

use qgate_core::{
    AccessMode, Catalog, CatalogEntry, ColumnDescriptor, ColumnRef, QualifiedName, Relationship,
    RewriteRule, SafeSchemaConfig, SensitivityPolicy,
};
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::introspect::{LiveSchema, LiveTable, SchemaIntrospector};

/// Builds catalogs for one safe-schema layout.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    safe: SafeSchemaConfig,
}

impl CatalogBuilder {
    pub fn new(safe: SafeSchemaConfig) -> Self {
        Self { safe }
    }

    /// Introspect the policy's source schema and build from it.
    pub async fn from_database(
        &self,
        introspector: &dyn SchemaIntrospector,
        policy: &SensitivityPolicy,
    ) -> Result<Catalog, CatalogError> {
        let live = introspector.introspect(&policy.source_schema).await?;
        self.build(&live, policy)
    }

    /// Pure transformation: identical inputs yield an identical catalog
    /// (and schema version).
    pub fn build(
        &self,
        live: &LiveSchema,
        policy: &SensitivityPolicy,
    ) -> Result<Catalog, CatalogError> {
        let mut entries = Vec::new();

        for table in policy.allowed_tables() {
            let live_table = live
                .tables
                .get(table)
                .ok_or_else(|| CatalogError::missing_table(table))?;
            entries.push(self.entry(live_table, live, policy)?);
        }

        let catalog = Catalog::new(&self.safe.schema, entries);
        info!(
            schema = %catalog.safe_schema,
            views = catalog.entries.len(),
            version = %catalog.schema_version,
            "built catalog"
        );
        Ok(catalog)
    }

    fn entry(
        &self,
        table: &LiveTable,
        live: &LiveSchema,
        policy: &SensitivityPolicy,
    ) -> Result<CatalogEntry, CatalogError> {
        let table_policy = policy.table(&table.name).cloned().unwrap_or_default();

        for column in table_policy.columns.keys() {
            if table.column(column).is_none() {
                return Err(CatalogError::missing_column(&table.name, column));
            }
        }

        let columns: Vec<ColumnDescriptor> = table
            .columns
            .iter()
            .filter_map(|column| {
                let rule = table_policy.columns.get(&column.name);
                match rule {
                    Some(rule) if rule.omit => None,
                    Some(rule) => Some(ColumnDescriptor {
                        name: column.name.clone(),
                        data_type: exposed_type(rule.rewrite, &column.data_type),
                        nullable: column.nullable,
                        sensitive: true,
                        rewrite: rule.rewrite,
                        comment: column.comment.clone(),
                    }),
                    None => Some(ColumnDescriptor {
                        name: column.name.clone(),
                        data_type: column.data_type.clone(),
                        nullable: column.nullable,
                        sensitive: false,
                        rewrite: None,
                        comment: column.comment.clone(),
                    }),
                }
            })
            .collect();

        if columns.is_empty() {
            return Err(CatalogError::PolicyMismatch {
                table: table.name.clone(),
                column: None,
                reason: "policy omits every column".to_string(),
            });
        }

        // A key is only meaningful when its values reach the view as-is.
        let primary_key = if table
            .primary_key
            .iter()
            .all(|key| table_policy.columns.get(key).is_none_or(|r| !r.omit && r.rewrite.is_none()))
        {
            table.primary_key.clone()
        } else {
            Vec::new()
        };

        let relationships = self.relationships(table, live, policy);
        debug!(
            table = %table.name,
            exposed = columns.len(),
            omitted = table.columns.len() - columns.len(),
            relationships = relationships.len(),
            "catalog entry"
        );

        Ok(CatalogEntry {
            schema: self.safe.schema.clone(),
            name: self.safe.view_name(&table.name),
            columns,
            primary_key,
            relationships,
            comment: table.comment.clone(),
            access: BTreeSet::from([AccessMode::Read]),
            source: QualifiedName::new(&policy.source_schema, &table.name),
            row_filter: table_policy.row_filter,
        })
    }

    /// Relationships whose both ends are exposed unmodified in the catalog.
    fn relationships(
        &self,
        table: &LiveTable,
        live: &LiveSchema,
        policy: &SensitivityPolicy,
    ) -> Vec<Relationship> {
        let passes_through = |table: &str, column: &str| {
            policy.table(table).is_some()
                && policy.rule(table, column).is_none()
                && live
                    .tables
                    .get(table)
                    .is_some_and(|t| t.column(column).is_some())
        };

        let mut relationships: Vec<Relationship> = table
            .foreign_keys
            .iter()
            .flat_map(|fk| fk.mappings.iter())
            .filter(|m| m.foreign_schema == policy.source_schema)
            .filter(|m| passes_through(&table.name, &m.column))
            .filter(|m| passes_through(&m.foreign_table, &m.foreign_column))
            .map(|m| Relationship {
                column: m.column.clone(),
                references: ColumnRef {
                    table: self.safe.view_name(&m.foreign_table),
                    column: m.foreign_column.clone(),
                },
            })
            .collect();
        relationships.sort();
        relationships.dedup();
        relationships
    }
}

/// Type of a column as seen through the view.
fn exposed_type(rule: Option<RewriteRule>, source_type: &str) -> String {
    match rule {
        Some(RewriteRule::Hash) | Some(RewriteRule::Mask) => "text".to_string(),
        Some(RewriteRule::Null) | None => source_type.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{ForeignKey, ForeignKeyMapping, LiveColumn};
    use pretty_assertions::assert_eq;

    fn col(name: &str, data_type: &str) -> LiveColumn {
        LiveColumn {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: name != "id",
            comment: None,
        }
    }

    fn fk(column: &str, table: &str) -> ForeignKey {
        ForeignKey {
            name: format!("{}_fkey", column),
            mappings: vec![ForeignKeyMapping {
                column: column.to_string(),
                foreign_schema: "hr".to_string(),
                foreign_table: table.to_string(),
                foreign_column: "id".to_string(),
            }],
        }
    }

    fn live() -> LiveSchema {
        let mut schema = LiveSchema {
            schema: "hr".to_string(),
            ..Default::default()
        };
        schema.tables.insert(
            "candidates".to_string(),
            LiveTable {
                name: "candidates".to_string(),
                columns: vec![
                    col("id", "integer"),
                    col("name", "text"),
                    col("email", "character varying(255)"),
                    col("cpf", "character(11)"),
                    col("department_id", "integer"),
                    col("recruiter_id", "integer"),
                    col("salary_expectation", "numeric(12,2)"),
                ],
                primary_key: vec!["id".to_string()],
                foreign_keys: vec![fk("department_id", "departments"), fk("recruiter_id", "recruiters")],
                comment: Some("Job applicants".to_string()),
            },
        );
        schema.tables.insert(
            "departments".to_string(),
            LiveTable {
                name: "departments".to_string(),
                columns: vec![col("id", "integer"), col("title", "text")],
                primary_key: vec!["id".to_string()],
                foreign_keys: vec![],
                comment: None,
            },
        );
        schema.tables.insert(
            "recruiters".to_string(),
            LiveTable {
                name: "recruiters".to_string(),
                columns: vec![col("id", "integer"), col("name", "text")],
                primary_key: vec!["id".to_string()],
                foreign_keys: vec![],
                comment: None,
            },
        );
        schema
    }

    fn policy() -> SensitivityPolicy {
        SensitivityPolicy::from_yaml(
            r#"
source_schema: hr
tables:
  candidates:
    row_filter: "deleted_at IS NULL"
    columns:
      email: { omit: true }
      cpf: { rewrite: hash }
      salary_expectation: { rewrite: nullify }
  departments: {}
"#,
        )
        .unwrap()
    }

    fn builder() -> CatalogBuilder {
        CatalogBuilder::new(SafeSchemaConfig {
            schema: "hr_safe".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_omitted_columns_are_absent() {
        let catalog = builder().build(&live(), &policy()).unwrap();
        let entry = catalog.entry("candidates_safe").unwrap();
        let names: Vec<_> = entry.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "name", "cpf", "department_id", "recruiter_id", "salary_expectation"]
        );
        assert!(!entry.exposes("email"));
    }

    #[test]
    fn test_rewritten_columns_are_flagged() {
        let catalog = builder().build(&live(), &policy()).unwrap();
        let entry = catalog.entry("candidates_safe").unwrap();

        let cpf = entry.column("cpf").unwrap();
        assert!(cpf.sensitive);
        assert_eq!(cpf.rewrite, Some(RewriteRule::Hash));
        assert_eq!(cpf.data_type, "text");

        let salary = entry.column("salary_expectation").unwrap();
        assert_eq!(salary.rewrite, Some(RewriteRule::Null));
        assert_eq!(salary.data_type, "numeric(12,2)");

        assert!(!entry.column("name").unwrap().sensitive);
    }

    #[test]
    fn test_only_allow_listed_tables() {
        let catalog = builder().build(&live(), &policy()).unwrap();
        let views: Vec<_> = catalog.view_names().collect();
        assert_eq!(views, vec!["candidates_safe", "departments_safe"]);
        assert!(catalog.entries.iter().all(|e| e.schema == "hr_safe"));
    }

    #[test]
    fn test_entry_metadata() {
        let catalog = builder().build(&live(), &policy()).unwrap();
        let entry = catalog.entry("candidates_safe").unwrap();
        assert_eq!(entry.source, QualifiedName::new("hr", "candidates"));
        assert_eq!(entry.row_filter.as_deref(), Some("deleted_at IS NULL"));
        assert_eq!(entry.access, BTreeSet::from([AccessMode::Read]));
    }

    #[test]
    fn test_primary_key_and_comments_are_exposed() {
        let mut live = live();
        if let Some(table) = live.tables.get_mut("candidates") {
            table.columns[3].comment = Some("national id".to_string());
        }
        let catalog = builder().build(&live, &policy()).unwrap();
        let entry = catalog.entry("candidates_safe").unwrap();
        assert_eq!(entry.primary_key, vec!["id".to_string()]);
        assert_eq!(entry.comment.as_deref(), Some("Job applicants"));
        assert_eq!(entry.column("cpf").unwrap().comment.as_deref(), Some("national id"));
        assert_eq!(catalog.entry("departments_safe").unwrap().comment, None);
    }

    #[test]
    fn test_redacted_primary_key_is_withheld() {
        let policy = SensitivityPolicy::from_yaml(
            "source_schema: hr\ntables:\n  departments:\n    columns:\n      id: { rewrite: hash }\n",
        )
        .unwrap();
        let catalog = builder().build(&live(), &policy).unwrap();
        assert!(catalog.entry("departments_safe").unwrap().primary_key.is_empty());
    }

    #[test]
    fn test_relationships_require_exposed_target() {
        let catalog = builder().build(&live(), &policy()).unwrap();
        let entry = catalog.entry("candidates_safe").unwrap();
        // recruiters is not allow-listed
        assert_eq!(
            entry.relationships,
            vec![Relationship {
                column: "department_id".to_string(),
                references: ColumnRef {
                    table: "departments_safe".to_string(),
                    column: "id".to_string(),
                },
            }]
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = builder().build(&live(), &policy()).unwrap();
        let b = builder().build(&live(), &policy()).unwrap();
        assert_eq!(a.schema_version, b.schema_version);
        assert_eq!(a.entries, b.entries);
    }

    #[test]
    fn test_version_changes_with_policy() {
        let a = builder().build(&live(), &policy()).unwrap();
        let mut relaxed = policy();
        relaxed
            .tables
            .get_mut("candidates")
            .unwrap()
            .columns
            .remove("email");
        let b = builder().build(&live(), &relaxed).unwrap();
        assert_ne!(a.schema_version, b.schema_version);
    }

    #[test]
    fn test_missing_table_is_a_mismatch() {
        let policy = SensitivityPolicy::from_yaml("source_schema: hr\ntables:\n  salaries: {}\n").unwrap();
        let err = builder().build(&live(), &policy).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::PolicyMismatch { ref table, column: None, .. } if table == "salaries"
        ));
    }

    #[test]
    fn test_missing_column_is_a_mismatch() {
        let policy = SensitivityPolicy::from_yaml(
            "source_schema: hr\ntables:\n  departments:\n    columns:\n      budget: { omit: true }\n",
        )
        .unwrap();
        let err = builder().build(&live(), &policy).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::PolicyMismatch { column: Some(ref c), .. } if c == "budget"
        ));
    }

    #[test]
    fn test_all_columns_omitted_is_a_mismatch() {
        let policy = SensitivityPolicy::from_yaml(
            "source_schema: hr\ntables:\n  departments:\n    columns:\n      id: { omit: true }\n      title: { omit: true }\n",
        )
        .unwrap();
        assert!(builder().build(&live(), &policy).is_err());
    }
}
