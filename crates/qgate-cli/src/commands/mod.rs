//! CLI command implementations.

pub mod catalog;
pub mod check;
pub mod provision;
pub mod query;
pub mod validate;
pub mod watch;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use qgate_core::GatewayConfig;
use qgate_runtime::{Gateway, TracingAuditSink};

/// Load the configuration file, resolving its policy reference.
pub fn load_config(path: &Path) -> Result<GatewayConfig> {
    GatewayConfig::load_with_context(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Open a gateway over the admin connection with audit events sent to the log.
pub async fn connect(path: &Path) -> Result<Gateway> {
    let config = load_config(path)?;
    Gateway::connect(config, Arc::new(TracingAuditSink))
        .await
        .context("Failed to connect to the database")
}

/// Write `content` to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
