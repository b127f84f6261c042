//! Configuration for the gateway.
//!
//! Loaded from a YAML file (`qgate.yaml`). The sensitivity policy can be given
//! inline under `policy` or referenced with `policy_file` (resolved relative to
//! the config file).
//!
//! ```yaml
//! database:
//!   database_url_env: QGATE_ADMIN_URL
//! safe_schema:
//!   schema: hr_safe
//!   principal: hr_reader
//! policy_file: policy.yaml
//! limits:
//!   default_rows: 100
//!   max_rows: 500
//! catalog:
//!   refresh_interval_seconds: 300
//! ```

pub mod database;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ident::is_plain_identifier;
use crate::policy::{PolicyError, SensitivityPolicy};

pub use database::{DatabaseConfig, PoolConfig};

/// Complete gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// Admin connection (introspection + provisioning).
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub safe_schema: SafeSchemaConfig,

    /// Inline sensitivity policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<SensitivityPolicy>,

    /// Path to the sensitivity policy (alternative to inline).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_file: Option<PathBuf>,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub validator: ValidatorConfig,
}

/// Where and how the safe schema is provisioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeSchemaConfig {
    /// Schema holding the generated views.
    #[serde(default = "default_safe_schema")]
    pub schema: String,

    /// Appended to the source table name to form the view name.
    #[serde(default = "default_view_suffix")]
    pub view_suffix: String,

    /// Restricted database role used for execution.
    #[serde(default = "default_principal")]
    pub principal: String,

    /// Server-side statement timeout set on the restricted role.
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

impl Default for SafeSchemaConfig {
    fn default() -> Self {
        Self {
            schema: default_safe_schema(),
            view_suffix: default_view_suffix(),
            principal: default_principal(),
            statement_timeout_ms: default_statement_timeout_ms(),
        }
    }
}

impl SafeSchemaConfig {
    /// View name for a source table.
    pub fn view_name(&self, table: &str) -> String {
        format!("{}{}", table, self.view_suffix)
    }
}

/// Row-count ceilings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LimitsConfig {
    /// Ceiling appended when a query has none.
    #[serde(default = "default_rows")]
    pub default_rows: u64,

    /// Hard maximum; larger limits are rewritten down to it.
    #[serde(default = "default_max_rows")]
    pub max_rows: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_rows: default_rows(),
            max_rows: default_max_rows(),
        }
    }
}

/// Catalog refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Seconds between automatic refreshes. 0 disables periodic refresh.
    #[serde(default)]
    pub refresh_interval_seconds: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: 0,
        }
    }
}

/// Restricted-profile execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Client-side timeout for one statement.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_execution_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout_seconds")]
    pub acquire_timeout_seconds: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_connections: default_execution_connections(),
            acquire_timeout_seconds: default_acquire_timeout_seconds(),
        }
    }
}

/// Extra denylist entries on top of the built-in ones.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub extra_forbidden_keywords: Vec<String>,

    #[serde(default)]
    pub extra_forbidden_functions: Vec<String>,
}

fn default_safe_schema() -> String {
    "gateway_safe".to_string()
}

fn default_view_suffix() -> String {
    "_safe".to_string()
}

fn default_principal() -> String {
    "gateway_reader".to_string()
}

fn default_statement_timeout_ms() -> u64 {
    15_000
}

fn default_rows() -> u64 {
    100
}

fn default_max_rows() -> u64 {
    500
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_execution_connections() -> u32 {
    5
}

fn default_acquire_timeout_seconds() -> u64 {
    5
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayConfig {
    /// Load configuration from a YAML file (no external references resolved).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration, resolve `policy_file` and validate the result.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        let base_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        if let Some(policy_file) = &config.policy_file {
            let policy_path = if policy_file.is_absolute() {
                policy_file.clone()
            } else {
                base_dir.join(policy_file)
            };
            config.policy = Some(SensitivityPolicy::from_file(&policy_path)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// The loaded policy, or an error when none was configured.
    pub fn policy(&self) -> Result<&SensitivityPolicy, ConfigError> {
        self.policy
            .as_ref()
            .ok_or_else(|| ConfigError::Config("no sensitivity policy configured".to_string()))
    }

    /// Cross-field checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        if limits.max_rows == 0 {
            return Err(ConfigError::Config("limits.max_rows must be > 0".to_string()));
        }
        if limits.default_rows == 0 || limits.default_rows > limits.max_rows {
            return Err(ConfigError::Config(format!(
                "limits.default_rows must be between 1 and max_rows ({})",
                limits.max_rows
            )));
        }

        let safe = &self.safe_schema;
        for (field, value) in [("safe_schema.schema", &safe.schema), ("safe_schema.principal", &safe.principal)] {
            if !is_plain_identifier(value) {
                return Err(ConfigError::Config(format!("{} '{}' is not a plain identifier", field, value)));
            }
        }
        if !safe.view_suffix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::Config(format!(
                "safe_schema.view_suffix '{}' is not a plain identifier suffix",
                safe.view_suffix
            )));
        }

        if let Some(policy) = &self.policy {
            policy.validate()?;
            if policy.source_schema == safe.schema {
                return Err(ConfigError::Config(
                    "safe_schema.schema must differ from the policy's source_schema".to_string(),
                ));
            }
        }

        if self.execution.timeout_ms == 0 {
            return Err(ConfigError::Config("execution.timeout_ms must be > 0".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::from_yaml("{}").unwrap();
        assert_eq!(config.limits.default_rows, 100);
        assert_eq!(config.limits.max_rows, 500);
        assert_eq!(config.safe_schema.schema, "gateway_safe");
        assert_eq!(config.safe_schema.view_name("candidates"), "candidates_safe");
        assert_eq!(config.catalog.refresh_interval_seconds, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_above_max_rejected() {
        let config = GatewayConfig::from_yaml("limits:\n  default_rows: 600\n  max_rows: 500\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Config(_))));
    }

    #[test]
    fn test_safe_schema_must_differ_from_source() {
        let yaml = "safe_schema:\n  schema: public\npolicy:\n  tables:\n    users: {}\n";
        let config = GatewayConfig::from_yaml(yaml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Config(_))));
    }

    #[test]
    fn test_bad_principal_rejected() {
        let config = GatewayConfig::from_yaml("safe_schema:\n  principal: \"x; drop\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_with_policy_file() {
        let dir = tempfile::tempdir().unwrap();
        let policy_path = dir.path().join("policy.yaml");
        let mut f = std::fs::File::create(&policy_path).unwrap();
        writeln!(f, "tables:\n  candidates:\n    columns:\n      email: {{ omit: true }}").unwrap();

        let config_path = dir.path().join("qgate.yaml");
        let mut f = std::fs::File::create(&config_path).unwrap();
        writeln!(f, "policy_file: policy.yaml\nlimits:\n  default_rows: 50\n  max_rows: 200").unwrap();

        let config = GatewayConfig::load_with_context(&config_path).unwrap();
        let policy = config.policy().unwrap();
        assert!(policy.is_omitted("candidates", "email"));
        assert_eq!(config.limits.default_rows, 50);
    }

    #[test]
    fn test_sample_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/qgate.yaml");
        let config = GatewayConfig::load_with_context(&path).unwrap();
        assert_eq!(config.safe_schema.view_name("candidates"), "candidates_safe");
        let policy = config.policy().unwrap();
        assert_eq!(policy.source_schema, "hr");
        assert!(policy.is_omitted("candidates", "email"));
        assert_eq!(
            policy.rule("candidates", "salary_expectation").and_then(|r| r.rewrite),
            Some(crate::policy::RewriteRule::Null)
        );
    }

    #[test]
    fn test_missing_policy_is_an_error() {
        let config = GatewayConfig::default();
        assert!(matches!(config.policy(), Err(ConfigError::Config(_))));
    }
}
