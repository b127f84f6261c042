//! Runs accepted verdicts through the restricted principal.

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use qgate_core::{ExecutionConfig, QueryResult, ValidationVerdict};
use qgate_provision::RestrictedPrincipal;

use crate::error::ExecutorError;
use crate::row::{column_names, row_to_map};

/// Executes validator-approved SQL. Holds a pool connected as the
/// restricted principal only; it never sees admin credentials in use.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    pool: PgPool,
    timeout: Duration,
    catalog_version: String,
}

impl QueryExecutor {
    /// Build a lazily connecting pool for `principal` on the database named
    /// by `database_url`. Any user and password in the URL are replaced.
    pub fn connect(
        database_url: &str,
        principal: &RestrictedPrincipal,
        catalog_version: impl Into<String>,
        config: &ExecutionConfig,
    ) -> Result<Self, ExecutorError> {
        let options = PgConnectOptions::from_str(database_url)?
            .username(&principal.role)
            .password(principal.credential.expose())
            .application_name("qgate")
            .options([("TimeZone", "UTC")]);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_lazy_with(options);

        info!(
            role = %principal.role,
            rotation_id = %principal.rotation_id,
            max_connections = config.max_connections,
            "restricted execution pool ready"
        );
        Ok(Self::from_pool(
            pool,
            catalog_version,
            Duration::from_millis(config.timeout_ms),
        ))
    }

    pub fn from_pool(pool: PgPool, catalog_version: impl Into<String>, timeout: Duration) -> Self {
        Self {
            pool,
            timeout,
            catalog_version: catalog_version.into(),
        }
    }

    /// Catalog version the restricted principal was provisioned for.
    pub fn catalog_version(&self) -> &str {
        &self.catalog_version
    }

    /// Round-trip a trivial statement to confirm the principal can log in.
    pub async fn ping(&self) -> Result<(), ExecutorError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Run an accepted verdict's normalized SQL. No retries happen here.
    pub async fn execute(&self, verdict: &ValidationVerdict) -> Result<QueryResult, ExecutorError> {
        let (Some(sql), Some(ceiling)) = (verdict.normalized_sql(), verdict.row_ceiling()) else {
            return Err(contract_violation());
        };
        if !verdict.is_accepted() {
            return Err(contract_violation());
        }
        if verdict.catalog_version() != self.catalog_version {
            return Err(ExecutorError::StaleCatalog {
                expected: self.catalog_version.clone(),
                found: verdict.catalog_version().to_string(),
            });
        }

        let started = Instant::now();
        let rows = tokio::time::timeout(self.timeout, sqlx::query(sql).fetch_all(&self.pool))
            .await
            .map_err(|_| ExecutorError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })??;
        let duration_ms = started.elapsed().as_millis() as u64;

        let columns = rows.first().map(column_names).unwrap_or_default();
        let rows: Vec<_> = rows.iter().map(row_to_map).collect();
        let row_count = rows.len() as u64;
        let truncated = reached_ceiling(row_count, ceiling);

        debug!(row_count, truncated, duration_ms, "query executed");
        Ok(QueryResult {
            columns,
            rows,
            row_count,
            truncated,
            duration_ms,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// A full page may have been cut short; a zero ceiling cuts nothing.
fn reached_ceiling(row_count: u64, ceiling: u64) -> bool {
    ceiling > 0 && row_count >= ceiling
}

/// Aborts in debug builds; logged and returned as an error in release.
fn contract_violation() -> ExecutorError {
    error!("executor was handed a rejected verdict; this is a caller bug");
    debug_assert!(false, "executor was handed a rejected verdict");
    ExecutorError::UnacceptedVerdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use qgate_core::{QuerySource, Rejection};

    fn lazy_executor() -> QueryExecutor {
        let options = PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .username("nobody");
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy_with(options);
        QueryExecutor::from_pool(pool, "v1", Duration::from_secs(1))
    }

    #[test]
    fn test_truncation_needs_a_nonzero_ceiling() {
        assert!(!reached_ceiling(0, 0));
        assert!(!reached_ceiling(4, 5));
        assert!(reached_ceiling(5, 5));
    }

    #[tokio::test]
    async fn test_stale_catalog_is_refused_before_connecting() {
        let executor = lazy_executor();
        let verdict = ValidationVerdict::accept(
            "SELECT 1 LIMIT 1".to_string(),
            1,
            "v0",
            QuerySource::ModelGenerated,
        );
        let err = executor.execute(&verdict).await.unwrap_err();
        assert!(matches!(err, ExecutorError::StaleCatalog { .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_connection_failure_is_an_execution_error() {
        let executor = lazy_executor();
        let verdict = ValidationVerdict::accept(
            "SELECT 1 LIMIT 1".to_string(),
            1,
            "v1",
            QuerySource::ModelGenerated,
        );
        let err = executor.execute(&verdict).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[cfg(debug_assertions)]
    #[tokio::test]
    #[should_panic(expected = "rejected verdict")]
    async fn test_rejected_verdict_aborts_in_debug() {
        let executor = lazy_executor();
        let verdict = ValidationVerdict::reject(
            Rejection::not_a_select("nope"),
            "v1",
            QuerySource::ModelGenerated,
        );
        let _ = executor.execute(&verdict).await;
    }
}
