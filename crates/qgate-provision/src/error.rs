use qgate_core::IdentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The provisioning transaction failed and was rolled back.
    #[error("provisioning failed: {0}")]
    Database(String),

    #[error("invalid identifier: {0}")]
    Identifier(#[from] IdentError),

    /// The catalog cannot be provisioned with the current settings.
    #[error("catalog mismatch: {0}")]
    CatalogMismatch(String),
}

impl From<sqlx::Error> for ProvisionError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}
