//! `qgate check` command implementation.
//!
//! Reports problems before anything is provisioned:
//! - configuration and sensitivity policy consistency
//! - JSON Schema validation of an outbound catalog document
//! - policy drift against the live source schema

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};

use qgate_core::GatewayConfig;

use super::{connect, load_config};

/// Compiled into the binary so validation works without external files.
const CATALOG_DOCUMENT_SCHEMA: &str =
    include_str!("../../../../schemas/CatalogDocument.schema.json");

// ============================================================================
// Check Result Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
        })
    }
}

/// A single check finding.
#[derive(Debug, Clone)]
pub struct CheckFinding {
    pub severity: Severity,
    /// Check that produced the finding.
    pub category: String,
    pub message: String,
    pub file: Option<PathBuf>,
    /// Location within the file or config (e.g. "tables.candidates").
    pub location: Option<String>,
}

impl CheckFinding {
    fn new(severity: Severity, category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            file: None,
            location: None,
        }
    }

    fn error(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    fn warning(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    fn info(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, category, message)
    }

    fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct CheckResults {
    pub findings: Vec<CheckFinding>,
}

impl CheckResults {
    fn extend(&mut self, findings: impl IntoIterator<Item = CheckFinding>) {
        self.findings.extend(findings);
    }

    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn print_summary(&self) {
        let mut findings: Vec<_> = self.findings.iter().collect();
        findings.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.category.cmp(&b.category)));

        for finding in &findings {
            print_finding(finding);
        }

        println!();
        println!("{}", "=".repeat(60));
        let errors = self.count(Severity::Error);
        let warnings = self.count(Severity::Warning);
        if errors == 0 && warnings == 0 {
            println!("All checks passed!");
        } else {
            println!("Summary: {} error(s), {} warning(s)", errors, warnings);
        }
    }
}

fn print_finding(finding: &CheckFinding) {
    let location = match (&finding.file, &finding.location) {
        (Some(f), Some(l)) => format!(" [{}:{}]", f.display(), l),
        (Some(f), None) => format!(" [{}]", f.display()),
        (None, Some(l)) => format!(" [{}]", l),
        (None, None) => String::new(),
    };
    println!(
        "  {:<5} [{}]{}: {}",
        finding.severity, finding.category, location, finding.message
    );
}

// ============================================================================
// Checks
// ============================================================================

fn check_policy(config: &GatewayConfig) -> Vec<CheckFinding> {
    let mut findings = Vec::new();
    let Some(policy) = &config.policy else {
        findings.push(CheckFinding::error(
            "policy",
            "No sensitivity policy configured (set `policy` or `policy_file`)",
        ));
        return findings;
    };

    let mut redactions = 0;
    for (table, table_policy) in &policy.tables {
        let rules = table_policy
            .columns
            .values()
            .filter(|r| r.omit || r.rewrite.is_some())
            .count();
        redactions += rules;
        if rules == 0 && table_policy.row_filter.is_none() {
            findings.push(
                CheckFinding::info("policy", format!("'{}' is exposed unmodified", table))
                    .with_location(format!("tables.{}", table)),
            );
        }
    }

    if policy.tables.is_empty() {
        findings.push(CheckFinding::error("policy", "Policy allow-lists no tables"));
    } else if redactions == 0 {
        findings.push(CheckFinding::warning(
            "policy",
            "Policy omits or rewrites no columns",
        ));
    }
    findings
}

fn check_limits(config: &GatewayConfig) -> Vec<CheckFinding> {
    let mut findings = Vec::new();
    let statement_timeout = config.safe_schema.statement_timeout_ms;
    if statement_timeout == 0 {
        findings.push(
            CheckFinding::warning("limits", "Restricted role has no server-side statement timeout")
                .with_location("safe_schema.statement_timeout_ms"),
        );
    } else if config.execution.timeout_ms > statement_timeout {
        findings.push(
            CheckFinding::info(
                "limits",
                format!(
                    "Client timeout ({} ms) exceeds the statement timeout ({} ms)",
                    config.execution.timeout_ms, statement_timeout
                ),
            )
            .with_location("execution.timeout_ms"),
        );
    }
    findings
}

/// Validate an outbound catalog document against the embedded JSON schema.
fn check_document(path: &Path) -> Result<Vec<CheckFinding>> {
    let mut findings = Vec::new();

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            findings.push(
                CheckFinding::error("json-schema", format!("Failed to read file: {}", e))
                    .with_file(path),
            );
            return Ok(findings);
        }
    };
    let instance: JsonValue = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            findings.push(
                CheckFinding::error("json-schema", format!("Failed to parse JSON: {}", e))
                    .with_file(path),
            );
            return Ok(findings);
        }
    };

    let schema: JsonValue = serde_json::from_str(CATALOG_DOCUMENT_SCHEMA)
        .context("embedded catalog document schema is not valid JSON")?;
    let compiled = match jsonschema::validator_for(&schema) {
        Ok(c) => c,
        Err(e) => {
            findings.push(CheckFinding::error(
                "json-schema",
                format!("Failed to compile JSON schema: {}", e),
            ));
            return Ok(findings);
        }
    };

    for error in compiled.iter_errors(&instance) {
        let path_str = error.instance_path().to_string();
        let location = if path_str.is_empty() {
            "(root)".to_string()
        } else {
            path_str
        };
        findings.push(
            CheckFinding::error("json-schema", format!("{}", error))
                .with_file(path)
                .with_location(location),
        );
    }
    Ok(findings)
}

/// Build the catalog from the live schema; policy drift surfaces here.
async fn check_live(config_path: &Path) -> Vec<CheckFinding> {
    let gateway = match connect(config_path).await {
        Ok(g) => g,
        Err(e) => return vec![CheckFinding::error("database", format!("{:#}", e))],
    };
    match gateway.build_catalog().await {
        Ok(catalog) => vec![CheckFinding::info(
            "catalog",
            format!(
                "{} view(s) in '{}', version {}",
                catalog.entries.len(),
                catalog.safe_schema,
                catalog.schema_version
            ),
        )],
        Err(e) => vec![CheckFinding::error("catalog", e.to_string())],
    }
}

// ============================================================================
// Main Check Runner
// ============================================================================

pub async fn run_quiet(
    config_path: &Path,
    document: Option<&Path>,
    offline: bool,
) -> Result<CheckResults> {
    let mut results = CheckResults::default();

    match load_config(config_path) {
        Ok(config) => {
            results.extend(check_policy(&config));
            results.extend(check_limits(&config));
            if !offline {
                results.extend(check_live(config_path).await);
            }
        }
        Err(e) => results.extend([
            CheckFinding::error("config", format!("{:#}", e)).with_file(config_path)
        ]),
    }

    if let Some(path) = document {
        results.extend(check_document(path)?);
    }
    Ok(results)
}

pub async fn run(config_path: &Path, document: Option<&Path>, offline: bool) -> Result<()> {
    println!("Checking {}", config_path.display());
    let results = run_quiet(config_path, document, offline).await?;
    results.print_summary();

    if results.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qgate_core::SensitivityPolicy;
    use tempfile::TempDir;

    fn config(policy: &str) -> GatewayConfig {
        GatewayConfig {
            policy: Some(SensitivityPolicy::from_yaml(policy).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_policy_without_redactions_warns() {
        let findings = check_policy(&config("source_schema: hr\ntables:\n  departments: {}\n"));
        assert!(findings.iter().any(|f| f.severity == Severity::Warning));
        assert!(
            findings
                .iter()
                .any(|f| f.severity == Severity::Info && f.location.as_deref() == Some("tables.departments"))
        );
    }

    #[test]
    fn test_redacting_policy_passes() {
        let findings = check_policy(&config(
            "source_schema: hr\ntables:\n  candidates:\n    columns:\n      email: { omit: true }\n",
        ));
        assert!(findings.is_empty());
    }

    #[test]
    fn test_missing_policy_is_an_error() {
        let findings = check_policy(&GatewayConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn test_disabled_statement_timeout_warns() {
        let mut config = GatewayConfig::default();
        config.safe_schema.statement_timeout_ms = 0;
        let findings = check_limits(&config);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_document_schema_errors_are_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, r#"{"format": "qgate.catalog/v1"}"#).unwrap();

        let findings = check_document(&path).unwrap();
        assert!(!findings.is_empty());
        assert!(findings.iter().all(|f| f.category == "json-schema"));
    }

    #[test]
    fn test_valid_document_passes() {
        let catalog = qgate_core::Catalog::new("hr_safe", vec![]);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, serde_json::to_string(&catalog.document()).unwrap()).unwrap();

        assert!(check_document(&path).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let results = run_quiet(&dir.path().join("missing.yaml"), None, true)
            .await
            .unwrap();
        assert!(results.has_errors());
        assert_eq!(results.findings[0].category, "config");
    }
}
