//! `qgate query`: provision, validate and execute one candidate.

use anyhow::{Context, Result};
use std::path::Path;

use qgate_runtime::QueryOutcome;

use super::connect;
use super::validate::{candidate, print_verdict};

pub async fn run(config_path: &Path, sql: &str, limit: Option<u64>, manual: bool) -> Result<()> {
    let gateway = connect(config_path).await?;
    gateway
        .refresh()
        .await
        .context("Failed to provision safe schema")?;

    match gateway.query(&candidate(sql, limit, manual)).await? {
        QueryOutcome::Rejected(verdict) => {
            print_verdict(&verdict)?;
            std::process::exit(1);
        }
        QueryOutcome::Completed { verdict, result } => {
            let output = serde_json::json!({
                "verdict": verdict,
                "result": result,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
