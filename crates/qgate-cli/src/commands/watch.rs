//! `qgate watch`: keep the safe schema in step with the source schema.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::connect;

pub async fn run(config_path: &Path) -> Result<()> {
    let gateway = Arc::new(connect(config_path).await?);
    gateway
        .refresh()
        .await
        .context("Failed to provision safe schema")?;

    let Some(handle) = gateway.clone().spawn_refresh() else {
        bail!("catalog.refresh_interval_seconds is 0; nothing to watch");
    };
    info!(
        interval_seconds = gateway.config().catalog.refresh_interval_seconds,
        "watching for schema changes"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    handle.abort();
    info!("shutting down");
    Ok(())
}
