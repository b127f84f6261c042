use thiserror::Error;

use qgate_catalog::CatalogError;
use qgate_core::ConfigError;
use qgate_executor::ExecutorError;
use qgate_provision::ProvisionError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("admin connection failed: {0}")]
    Connection(String),

    #[error("safe schema has not been provisioned yet")]
    NotProvisioned,
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::Connection(err.to_string())
    }
}
