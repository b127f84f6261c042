//! Deterministic rendering of the safe schema DDL.
//!
//! A [`ProvisionPlan`] is a pure function of the catalog and the safe-schema
//! settings: the same inputs always render byte-identical statements. The
//! credential statement is rendered separately and never kept in the plan.

use serde::Serialize;
use std::collections::BTreeSet;

use qgate_core::ident::{quote_ident, quote_literal, quote_qualified};
use qgate_core::{Catalog, CatalogEntry, ColumnDescriptor, RewriteRule, SafeSchemaConfig};

use crate::credentials::Credential;
use crate::error::ProvisionError;

/// Value shown in place of masked columns.
pub const MASK_TEXT: &str = "****";

/// One generated view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewDefinition {
    pub schema: String,
    pub name: String,
    /// Complete `CREATE VIEW` statement.
    pub sql: String,
}

/// Every statement of one provisioning run, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub schema: String,
    pub principal: String,
    pub source_schemas: BTreeSet<String>,
    /// Drop and recreate the safe schema.
    pub setup: Vec<String>,
    pub views: Vec<ViewDefinition>,
    /// Revokes on the source schemas, then grants on the safe schema.
    pub privileges: Vec<String>,
    /// Session defaults pinned on the restricted role.
    pub role_settings: Vec<String>,
}

impl ProvisionPlan {
    pub fn build(catalog: &Catalog, settings: &SafeSchemaConfig) -> Result<Self, ProvisionError> {
        if catalog.safe_schema != settings.schema {
            return Err(ProvisionError::CatalogMismatch(format!(
                "catalog targets schema '{}' but provisioning is configured for '{}'",
                catalog.safe_schema, settings.schema
            )));
        }
        if catalog.entries.is_empty() {
            return Err(ProvisionError::CatalogMismatch(
                "catalog has no entries".to_string(),
            ));
        }

        let schema = quote_ident(&settings.schema)?;
        let role = quote_ident(&settings.principal)?;

        let source_schemas: BTreeSet<String> = catalog
            .entries
            .iter()
            .map(|e| e.source.schema.clone())
            .collect();
        if source_schemas.contains(&settings.schema) {
            return Err(ProvisionError::CatalogMismatch(
                "safe schema must differ from the source schema".to_string(),
            ));
        }

        let setup = vec![
            format!("DROP SCHEMA IF EXISTS {} CASCADE", schema),
            format!("CREATE SCHEMA {}", schema),
        ];

        let views = catalog
            .entries
            .iter()
            .map(render_view)
            .collect::<Result<Vec<_>, _>>()?;

        let mut privileges = Vec::new();
        for source in &source_schemas {
            let source = quote_ident(source)?;
            privileges.push(format!("REVOKE ALL ON SCHEMA {} FROM {}", source, role));
            privileges.push(format!(
                "REVOKE ALL ON ALL TABLES IN SCHEMA {} FROM {}",
                source, role
            ));
        }
        privileges.push(format!("REVOKE ALL ON SCHEMA {} FROM PUBLIC", schema));
        privileges.push(format!("GRANT USAGE ON SCHEMA {} TO {}", schema, role));
        for view in &views {
            privileges.push(format!(
                "GRANT SELECT ON {} TO {}",
                quote_qualified(&view.schema, &view.name)?,
                role
            ));
        }

        let role_settings = vec![
            format!("ALTER ROLE {} SET search_path = {}", role, schema),
            format!("ALTER ROLE {} SET default_transaction_read_only = on", role),
            format!(
                "ALTER ROLE {} SET statement_timeout = {}",
                role, settings.statement_timeout_ms
            ),
            format!("ALTER ROLE {} SET standard_conforming_strings = on", role),
        ];

        Ok(Self {
            schema: settings.schema.clone(),
            principal: settings.principal.clone(),
            source_schemas,
            setup,
            views,
            privileges,
            role_settings,
        })
    }

    /// Creates the role when it does not exist yet.
    pub fn create_role_statement(&self) -> Result<String, ProvisionError> {
        Ok(format!(
            "CREATE ROLE {} NOLOGIN NOSUPERUSER NOCREATEDB NOCREATEROLE NOINHERIT",
            quote_ident(&self.principal)?
        ))
    }

    /// Rotates the role's password. Contains the secret: execute it, never
    /// log or store it.
    pub fn credential_statement(&self, credential: &Credential) -> Result<String, ProvisionError> {
        Ok(format!(
            "ALTER ROLE {} WITH LOGIN PASSWORD {}",
            quote_ident(&self.principal)?,
            quote_literal(credential.expose())
        ))
    }

    /// All statements (credential excluded) in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.setup
            .iter()
            .map(String::as_str)
            .chain(self.views.iter().map(|v| v.sql.as_str()))
            .chain(self.privileges.iter().map(String::as_str))
            .chain(self.role_settings.iter().map(String::as_str))
    }

    /// The plan as one SQL script, for review and dry runs.
    pub fn script(&self) -> String {
        let mut out = String::new();
        for statement in self.statements() {
            out.push_str(statement);
            out.push_str(";\n");
        }
        out
    }

    /// Privileges the restricted principal ends up holding.
    pub fn grant_set(&self) -> BTreeSet<String> {
        let mut grants = BTreeSet::new();
        grants.insert(format!("USAGE ON SCHEMA {}", self.schema));
        for view in &self.views {
            grants.insert(format!("SELECT ON {}.{}", view.schema, view.name));
        }
        grants
    }
}

fn render_view(entry: &CatalogEntry) -> Result<ViewDefinition, ProvisionError> {
    let projections = entry
        .columns
        .iter()
        .map(render_projection)
        .collect::<Result<Vec<_>, _>>()?;

    let mut sql = format!(
        "CREATE VIEW {} WITH (security_barrier = true) AS SELECT {} FROM {}",
        quote_qualified(&entry.schema, &entry.name)?,
        projections.join(", "),
        quote_qualified(&entry.source.schema, &entry.source.name)?
    );
    if let Some(filter) = &entry.row_filter {
        sql.push_str(&format!(" WHERE ({})", filter));
    }

    Ok(ViewDefinition {
        schema: entry.schema.clone(),
        name: entry.name.clone(),
        sql,
    })
}

fn render_projection(column: &ColumnDescriptor) -> Result<String, ProvisionError> {
    let name = quote_ident(&column.name)?;
    Ok(match column.rewrite {
        None => name,
        Some(RewriteRule::Null) => format!("NULL::{} AS {}", column.data_type, name),
        Some(RewriteRule::Hash) => format!("md5({}::text) AS {}", name, name),
        Some(RewriteRule::Mask) => format!(
            "CASE WHEN {} IS NULL THEN NULL ELSE {} END AS {}",
            name,
            quote_literal(MASK_TEXT),
            name
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use qgate_core::{AccessMode, QualifiedName};
    use std::collections::BTreeSet;

    fn column(name: &str, data_type: &str, rewrite: Option<RewriteRule>) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: true,
            sensitive: rewrite.is_some(),
            rewrite,
            comment: None,
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(
            "hr_safe",
            vec![
                CatalogEntry {
                    schema: "hr_safe".to_string(),
                    name: "candidates_safe".to_string(),
                    columns: vec![
                        column("id", "integer", None),
                        column("name", "text", None),
                        column("cpf", "text", Some(RewriteRule::Hash)),
                        column("phone", "text", Some(RewriteRule::Mask)),
                        column("salary", "numeric(12,2)", Some(RewriteRule::Null)),
                    ],
                    primary_key: vec!["id".to_string()],
                    relationships: vec![],
                    comment: None,
                    access: BTreeSet::from([AccessMode::Read]),
                    source: QualifiedName::new("hr", "candidates"),
                    row_filter: Some("deleted_at IS NULL".to_string()),
                },
                CatalogEntry {
                    schema: "hr_safe".to_string(),
                    name: "departments_safe".to_string(),
                    columns: vec![column("id", "integer", None), column("title", "text", None)],
                    primary_key: vec!["id".to_string()],
                    relationships: vec![],
                    comment: None,
                    access: BTreeSet::from([AccessMode::Read]),
                    source: QualifiedName::new("hr", "departments"),
                    row_filter: None,
                },
            ],
        )
    }

    fn settings() -> SafeSchemaConfig {
        SafeSchemaConfig {
            schema: "hr_safe".to_string(),
            principal: "hr_reader".to_string(),
            statement_timeout_ms: 5000,
            ..Default::default()
        }
    }

    #[test]
    fn test_view_rendering() {
        let plan = ProvisionPlan::build(&catalog(), &settings()).unwrap();
        assert_eq!(
            plan.views[0].sql,
            "CREATE VIEW \"hr_safe\".\"candidates_safe\" WITH (security_barrier = true) AS SELECT \
             \"id\", \"name\", md5(\"cpf\"::text) AS \"cpf\", \
             CASE WHEN \"phone\" IS NULL THEN NULL ELSE '****' END AS \"phone\", \
             NULL::numeric(12,2) AS \"salary\" \
             FROM \"hr\".\"candidates\" WHERE (deleted_at IS NULL)"
        );
        assert_eq!(
            plan.views[1].sql,
            "CREATE VIEW \"hr_safe\".\"departments_safe\" WITH (security_barrier = true) AS SELECT \
             \"id\", \"title\" FROM \"hr\".\"departments\""
        );
    }

    #[test]
    fn test_statement_order() {
        let plan = ProvisionPlan::build(&catalog(), &settings()).unwrap();
        let statements: Vec<_> = plan.statements().collect();
        assert_eq!(statements[0], "DROP SCHEMA IF EXISTS \"hr_safe\" CASCADE");
        assert_eq!(statements[1], "CREATE SCHEMA \"hr_safe\"");
        assert!(statements[2].starts_with("CREATE VIEW \"hr_safe\".\"candidates_safe\""));
        assert_eq!(statements[4], "REVOKE ALL ON SCHEMA \"hr\" FROM \"hr_reader\"");
        assert_eq!(
            statements[statements.len() - 4],
            "ALTER ROLE \"hr_reader\" SET search_path = \"hr_safe\""
        );
        assert!(statements.contains(&"ALTER ROLE \"hr_reader\" SET default_transaction_read_only = on"));
        assert!(statements.contains(&"ALTER ROLE \"hr_reader\" SET statement_timeout = 5000"));
    }

    #[test]
    fn test_plan_is_idempotent() {
        let catalog = catalog();
        let first = ProvisionPlan::build(&catalog, &settings()).unwrap();
        let second = ProvisionPlan::build(&catalog, &settings()).unwrap();
        assert_eq!(first.script(), second.script());
        assert_eq!(first.grant_set(), second.grant_set());
    }

    #[test]
    fn test_grant_set() {
        let plan = ProvisionPlan::build(&catalog(), &settings()).unwrap();
        let grants: Vec<_> = plan.grant_set().into_iter().collect();
        assert_eq!(
            grants,
            vec![
                "SELECT ON hr_safe.candidates_safe",
                "SELECT ON hr_safe.departments_safe",
                "USAGE ON SCHEMA hr_safe",
            ]
        );
    }

    #[test]
    fn test_script_never_contains_credential() {
        let plan = ProvisionPlan::build(&catalog(), &settings()).unwrap();
        let credential = Credential::from_secret("s3cretValue");
        let statement = plan.credential_statement(&credential).unwrap();
        assert_eq!(
            statement,
            "ALTER ROLE \"hr_reader\" WITH LOGIN PASSWORD 's3cretValue'"
        );
        assert!(!plan.script().contains("s3cretValue"));
        assert!(!plan.script().contains("PASSWORD"));
    }

    #[test]
    fn test_schema_mismatch() {
        let mut settings = settings();
        settings.schema = "other_safe".to_string();
        assert!(matches!(
            ProvisionPlan::build(&catalog(), &settings),
            Err(ProvisionError::CatalogMismatch(_))
        ));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let catalog = Catalog::new("hr_safe", vec![]);
        assert!(ProvisionPlan::build(&catalog, &settings()).is_err());
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let mut catalog = catalog();
        catalog.entries[1].columns[0].name = "id\"; DROP".to_string();
        assert!(matches!(
            ProvisionPlan::build(&catalog, &settings()),
            Err(ProvisionError::Identifier(_))
        ));
    }
}
