//! Read-only introspection of the source schema.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::CatalogError;

/// Structure of the source schema as the database reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveSchema {
    pub schema: String,
    pub tables: BTreeMap<String, LiveTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveTable {
    pub name: String,
    /// Columns in ordinal order.
    pub columns: Vec<LiveColumn>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    /// `COMMENT ON TABLE` text.
    pub comment: Option<String>,
}

impl LiveTable {
    pub fn column(&self, name: &str) -> Option<&LiveColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    pub name: String,
    /// Castable type name (`format_type` output, e.g. `character varying(255)`).
    pub data_type: String,
    pub nullable: bool,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: String,
    pub mappings: Vec<ForeignKeyMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyMapping {
    pub column: String,
    pub foreign_schema: String,
    pub foreign_table: String,
    pub foreign_column: String,
}

/// Source of live schema structure.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    async fn introspect(&self, schema: &str) -> Result<LiveSchema, CatalogError>;
}

/// Introspects a Postgres schema through the admin pool.
#[derive(Clone)]
pub struct PgIntrospector {
    pool: PgPool,
}

impl PgIntrospector {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<LiveColumn>, CatalogError> {
        // format_type gives names usable in casts, unlike information_schema.data_type.
        let rows = sqlx::query(
            r#"
            select a.attname::text as column_name,
                   format_type(a.atttypid, a.atttypmod) as data_type,
                   not a.attnotnull as nullable,
                   col_description(a.attrelid, a.attnum) as comment
            from pg_catalog.pg_attribute a
            join pg_catalog.pg_class c on c.oid = a.attrelid
            join pg_catalog.pg_namespace n on n.oid = c.relnamespace
            where n.nspname = $1
              and c.relname = $2
              and a.attnum > 0
              and not a.attisdropped
            order by a.attnum
            "#,
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LiveColumn {
                name: r.get("column_name"),
                data_type: r.get("data_type"),
                nullable: r.get("nullable"),
                comment: r.get("comment"),
            })
            .collect())
    }

    async fn primary_key(&self, schema: &str, table: &str) -> Result<Vec<String>, CatalogError> {
        let rows = sqlx::query(
            r#"
            select kcu.column_name::text as column_name
            from information_schema.table_constraints tc
            join information_schema.key_column_usage kcu
              on tc.constraint_name = kcu.constraint_name
             and tc.table_schema = kcu.table_schema
            where tc.constraint_type = 'PRIMARY KEY'
              and tc.table_schema = $1
              and tc.table_name = $2
            order by kcu.ordinal_position
            "#,
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| r.get::<String, _>("column_name"))
            .collect())
    }

    async fn foreign_keys(&self, schema: &str, table: &str) -> Result<Vec<ForeignKey>, CatalogError> {
        let rows = sqlx::query(
            r#"
            select
              tc.constraint_name::text as constraint_name,
              kcu.column_name::text as column_name,
              ccu.table_schema::text as foreign_table_schema,
              ccu.table_name::text as foreign_table_name,
              ccu.column_name::text as foreign_column_name
            from information_schema.table_constraints tc
            join information_schema.key_column_usage kcu
              on tc.constraint_name = kcu.constraint_name
             and tc.table_schema = kcu.table_schema
            join information_schema.constraint_column_usage ccu
              on ccu.constraint_name = tc.constraint_name
             and ccu.table_schema = tc.table_schema
            where tc.constraint_type = 'FOREIGN KEY'
              and tc.table_schema = $1
              and tc.table_name = $2
            order by tc.constraint_name, kcu.ordinal_position
            "#,
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        // Grouped by constraint name for stable output.
        let mut grouped: BTreeMap<String, Vec<ForeignKeyMapping>> = BTreeMap::new();
        for row in rows {
            let name: String = row.get("constraint_name");
            grouped.entry(name).or_default().push(ForeignKeyMapping {
                column: row.get("column_name"),
                foreign_schema: row.get("foreign_table_schema"),
                foreign_table: row.get("foreign_table_name"),
                foreign_column: row.get("foreign_column_name"),
            });
        }

        Ok(grouped
            .into_iter()
            .map(|(name, mappings)| ForeignKey { name, mappings })
            .collect())
    }
}

#[async_trait]
impl SchemaIntrospector for PgIntrospector {
    async fn introspect(&self, schema: &str) -> Result<LiveSchema, CatalogError> {
        let table_rows = sqlx::query(
            r#"
            select c.relname::text as table_name,
                   obj_description(c.oid, 'pg_class') as comment
            from pg_catalog.pg_class c
            join pg_catalog.pg_namespace n on n.oid = c.relnamespace
            where c.relkind in ('r', 'p')
              and n.nspname = $1
            order by c.relname
            "#,
        )
        .bind(schema)
        .fetch_all(&self.pool)
        .await?;

        let mut tables = BTreeMap::new();
        for row in table_rows {
            let name: String = row.get("table_name");
            let table = LiveTable {
                columns: self.columns(schema, &name).await?,
                primary_key: self.primary_key(schema, &name).await?,
                foreign_keys: self.foreign_keys(schema, &name).await?,
                comment: row.get("comment"),
                name: name.clone(),
            };
            debug!(table = %name, columns = table.columns.len(), "introspected table");
            tables.insert(name, table);
        }

        info!(schema = %schema, tables = tables.len(), "introspected source schema");
        Ok(LiveSchema {
            schema: schema.to_string(),
            tables,
        })
    }
}
