//! The gateway: current snapshot, validation, execution and refresh.

use serde_json::json;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use qgate_catalog::{CatalogBuilder, PgIntrospector, SchemaIntrospector};
use qgate_core::{CandidateQuery, Catalog, GatewayConfig, QueryResult, ValidationVerdict};
use qgate_executor::{ExecutorError, QueryExecutor};
use qgate_provision::{SafeSchema, SafeSchemaProvisioner};
use qgate_validator::QueryValidator;

use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::error::GatewayError;

/// Catalog, provisioned schema and executor that belong together.
#[derive(Debug)]
pub struct Snapshot {
    pub catalog: Arc<Catalog>,
    pub safe_schema: SafeSchema,
    pub executor: QueryExecutor,
}

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Catalog unchanged; the current snapshot was kept.
    Unchanged,
    /// A new catalog was provisioned and the snapshot swapped.
    Reprovisioned,
}

/// Result of validating and (if accepted) executing a candidate.
#[derive(Debug)]
pub enum QueryOutcome {
    Rejected(ValidationVerdict),
    Completed {
        verdict: ValidationVerdict,
        result: QueryResult,
    },
}

pub struct Gateway {
    config: GatewayConfig,
    database_url: String,
    introspector: Arc<dyn SchemaIntrospector>,
    builder: CatalogBuilder,
    provisioner: SafeSchemaProvisioner,
    validator: QueryValidator,
    audit: Arc<dyn AuditSink>,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl Gateway {
    /// Open the admin pool. Nothing is provisioned until [`Gateway::refresh`].
    pub async fn connect(
        config: GatewayConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;
        let database_url = config.database.connection_string();
        let pool_config = &config.database.pool;
        let admin_pool = PgPoolOptions::new()
            .min_connections(pool_config.min_connections)
            .max_connections(pool_config.max_connections)
            .acquire_timeout(Duration::from_secs(pool_config.acquire_timeout_seconds))
            .connect(&database_url)
            .await?;

        info!(
            max_connections = pool_config.max_connections,
            env_credentials = config.database.uses_env_credentials(),
            "admin pool connected"
        );
        let introspector = Arc::new(PgIntrospector::new(admin_pool.clone()));
        Ok(Self::with_parts(config, database_url, admin_pool, introspector, audit))
    }

    pub fn with_parts(
        config: GatewayConfig,
        database_url: String,
        admin_pool: PgPool,
        introspector: Arc<dyn SchemaIntrospector>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let builder = CatalogBuilder::new(config.safe_schema.clone());
        let provisioner = SafeSchemaProvisioner::new(admin_pool, config.safe_schema.clone());
        let validator = QueryValidator::with_config(config.limits, &config.validator);
        Self {
            config,
            database_url,
            introspector,
            builder,
            provisioner,
            validator,
            audit,
            current: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Current snapshot.
    pub async fn snapshot(&self) -> Result<Arc<Snapshot>, GatewayError> {
        self.current
            .read()
            .await
            .clone()
            .ok_or(GatewayError::NotProvisioned)
    }

    pub async fn catalog(&self) -> Result<Arc<Catalog>, GatewayError> {
        Ok(self.snapshot().await?.catalog.clone())
    }

    /// Build the catalog from the live schema without provisioning it.
    pub async fn build_catalog(&self) -> Result<Catalog, GatewayError> {
        let policy = self.config.policy()?;
        Ok(self
            .builder
            .from_database(self.introspector.as_ref(), policy)
            .await?)
    }

    /// Rebuild the catalog; reprovision only when its version changed.
    pub async fn refresh(&self) -> Result<RefreshOutcome, GatewayError> {
        let catalog = self.build_catalog().await?;
        if let Some(current) = self.current.read().await.as_ref()
            && current.catalog.schema_version == catalog.schema_version
        {
            info!(version = %catalog.schema_version, "catalog unchanged");
            return Ok(RefreshOutcome::Unchanged);
        }
        self.install(catalog).await?;
        Ok(RefreshOutcome::Reprovisioned)
    }

    /// Rebuild and reprovision unconditionally (rotates the credential).
    pub async fn reprovision(&self) -> Result<Arc<Snapshot>, GatewayError> {
        let catalog = self.build_catalog().await?;
        self.install(catalog).await
    }

    async fn install(&self, catalog: Catalog) -> Result<Arc<Snapshot>, GatewayError> {
        let version = catalog.schema_version.clone();
        let safe_schema = match self.provisioner.provision(&catalog).await {
            Ok(safe_schema) => safe_schema,
            Err(e) => {
                self.audit.record(AuditEvent::new(
                    AuditAction::Provision,
                    &version,
                    false,
                    json!({ "error": e.to_string() }),
                ));
                return Err(e.into());
            }
        };

        let executor = QueryExecutor::connect(
            &self.database_url,
            &safe_schema.principal,
            &version,
            &self.config.execution,
        )?;

        self.audit.record(AuditEvent::new(
            AuditAction::Provision,
            &version,
            true,
            json!({
                "schema": safe_schema.schema,
                "views": safe_schema.views.len(),
                "rotation_id": safe_schema.principal.rotation_id,
            }),
        ));

        let snapshot = Arc::new(Snapshot {
            catalog: Arc::new(catalog),
            safe_schema,
            executor,
        });
        *self.current.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Validate against the current catalog snapshot.
    pub async fn validate(&self, candidate: &CandidateQuery) -> Result<ValidationVerdict, GatewayError> {
        let snapshot = self.snapshot().await?;
        let verdict = self.validator.validate(candidate, &snapshot.catalog);

        let detail = match verdict.rejection() {
            Some(rejection) => json!({
                "sql": candidate.sql,
                "rejection": rejection.kind,
                "reason": rejection.reason,
            }),
            None => json!({
                "sql": candidate.sql,
                "normalized_sql": verdict.normalized_sql(),
                "row_ceiling": verdict.row_ceiling(),
            }),
        };
        self.audit.record(
            AuditEvent::new(
                AuditAction::Validate,
                verdict.catalog_version(),
                verdict.is_accepted(),
                detail,
            )
            .with_source(candidate.source),
        );
        Ok(verdict)
    }

    /// Execute an accepted verdict. Verdicts from an older catalog are
    /// refused with a stale-catalog error.
    pub async fn execute(&self, verdict: &ValidationVerdict) -> Result<QueryResult, GatewayError> {
        let snapshot = self.snapshot().await?;
        let outcome = snapshot.executor.execute(verdict).await;

        let detail = match &outcome {
            Ok(result) => json!({
                "row_count": result.row_count,
                "truncated": result.truncated,
                "duration_ms": result.duration_ms,
            }),
            Err(e) => json!({ "error": e.to_string() }),
        };
        self.audit.record(
            AuditEvent::new(
                AuditAction::Execute,
                verdict.catalog_version(),
                outcome.is_ok(),
                detail,
            )
            .with_source(verdict.source()),
        );

        if let Err(ExecutorError::StaleCatalog { expected, found }) = &outcome {
            warn!(%expected, %found, "refused verdict from a stale catalog");
        }
        Ok(outcome?)
    }

    /// Validate, then execute when accepted.
    pub async fn query(&self, candidate: &CandidateQuery) -> Result<QueryOutcome, GatewayError> {
        let verdict = self.validate(candidate).await?;
        if !verdict.is_accepted() {
            return Ok(QueryOutcome::Rejected(verdict));
        }
        let result = self.execute(&verdict).await?;
        Ok(QueryOutcome::Completed { verdict, result })
    }

    /// Periodically refresh the catalog when an interval is configured.
    /// Failures are logged and the previous snapshot stays in service.
    pub fn spawn_refresh(self: Arc<Self>) -> Option<JoinHandle<()>> {
        let seconds = self.config.catalog.refresh_interval_seconds;
        if seconds == 0 {
            return None;
        }

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(seconds));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match self.refresh().await {
                    Ok(outcome) => info!(?outcome, "periodic catalog refresh"),
                    Err(e) => error!(error = %e, "periodic catalog refresh failed"),
                }
            }
        }))
    }
}
