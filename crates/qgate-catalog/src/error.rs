//! Error types for catalog building.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The live schema could not be read.
    #[error("catalog introspection failed: {0}")]
    Introspection(String),

    /// The sensitivity policy names something the live schema lacks, or
    /// would produce an unusable view.
    #[error("policy mismatch on {}: {reason}", target(.table, .column.as_deref()))]
    PolicyMismatch {
        table: String,
        column: Option<String>,
        reason: String,
    },
}

fn target(table: &str, column: Option<&str>) -> String {
    match column {
        Some(column) => format!("{}.{}", table, column),
        None => table.to_string(),
    }
}

impl CatalogError {
    pub fn missing_table(table: &str) -> Self {
        Self::PolicyMismatch {
            table: table.to_string(),
            column: None,
            reason: "table does not exist in the source schema".to_string(),
        }
    }

    pub fn missing_column(table: &str, column: &str) -> Self {
        Self::PolicyMismatch {
            table: table.to_string(),
            column: Some(column.to_string()),
            reason: "column does not exist in the source table".to_string(),
        }
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        Self::Introspection(err.to_string())
    }
}
