//! `qgate validate`: offline validation against a saved catalog.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use qgate_core::{CandidateQuery, Catalog, ValidationVerdict};
use qgate_validator::QueryValidator;

use super::load_config;

pub fn run(
    config_path: &Path,
    catalog_path: &Path,
    sql: &str,
    limit: Option<u64>,
    manual: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let content = fs::read_to_string(catalog_path)
        .with_context(|| format!("Failed to read catalog {}", catalog_path.display()))?;
    let catalog = Catalog::from_json(&content)
        .with_context(|| format!("Failed to parse catalog {}", catalog_path.display()))?;

    let validator = QueryValidator::with_config(config.limits, &config.validator);
    let verdict = validator.validate(&candidate(sql, limit, manual), &catalog);
    print_verdict(&verdict)?;

    if !verdict.is_accepted() {
        std::process::exit(1);
    }
    Ok(())
}

pub fn candidate(sql: &str, limit: Option<u64>, manual: bool) -> CandidateQuery {
    let candidate = if manual {
        CandidateQuery::manual(sql)
    } else {
        CandidateQuery::new(sql)
    };
    match limit {
        Some(limit) => candidate.with_limit(limit),
        None => candidate,
    }
}

pub fn print_verdict(verdict: &ValidationVerdict) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(verdict)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qgate_core::QuerySource;

    #[test]
    fn candidate_carries_flags() {
        let c = candidate("SELECT 1", Some(10), true);
        assert_eq!(c.source, QuerySource::Manual);
        assert_eq!(c.requested_limit, Some(10));

        let c = candidate("SELECT 1", None, false);
        assert_eq!(c.source, QuerySource::ModelGenerated);
        assert_eq!(c.requested_limit, None);
    }
}
