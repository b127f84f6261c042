//! Applies a [`ProvisionPlan`] in one transaction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::BTreeSet;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use qgate_core::{Catalog, SafeSchemaConfig};

use crate::credentials::Credential;
use crate::error::ProvisionError;
use crate::plan::{ProvisionPlan, ViewDefinition};

/// The restricted role and its current credential.
#[derive(Debug, Clone, Serialize)]
pub struct RestrictedPrincipal {
    pub role: String,
    #[serde(skip)]
    pub credential: Credential,
    /// Changes on every provisioning run.
    pub rotation_id: Uuid,
}

/// Result of a successful provisioning run.
#[derive(Debug, Clone, Serialize)]
pub struct SafeSchema {
    pub schema: String,
    /// Version of the catalog the views were generated from.
    pub catalog_version: String,
    pub views: Vec<ViewDefinition>,
    pub principal: RestrictedPrincipal,
    pub grants: BTreeSet<String>,
    pub provisioned_at: DateTime<Utc>,
}

/// Creates and refreshes the safe schema over the admin connection.
///
/// Runs are serialized twice: an in-process mutex orders callers sharing
/// this provisioner, and a transaction-scoped advisory lock orders separate
/// processes provisioning the same schema.
pub struct SafeSchemaProvisioner {
    pool: PgPool,
    settings: SafeSchemaConfig,
    lock: Mutex<()>,
}

impl SafeSchemaProvisioner {
    pub fn new(pool: PgPool, settings: SafeSchemaConfig) -> Self {
        Self {
            pool,
            settings,
            lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &SafeSchemaConfig {
        &self.settings
    }

    /// Render the plan without touching the database.
    pub fn plan(&self, catalog: &Catalog) -> Result<ProvisionPlan, ProvisionError> {
        ProvisionPlan::build(catalog, &self.settings)
    }

    /// Replace the safe schema with views for `catalog` and rotate the
    /// restricted principal's credential. On failure nothing is changed.
    pub async fn provision(&self, catalog: &Catalog) -> Result<SafeSchema, ProvisionError> {
        let plan = self.plan(catalog)?;
        let credential = Credential::generate();

        let _guard = self.lock.lock().await;
        if let Err(e) = self.apply(&plan, &credential).await {
            warn!(schema = %plan.schema, error = %e, "provisioning rolled back");
            return Err(e);
        }

        let safe_schema = SafeSchema {
            schema: plan.schema.clone(),
            catalog_version: catalog.schema_version.clone(),
            grants: plan.grant_set(),
            views: plan.views,
            principal: RestrictedPrincipal {
                role: plan.principal,
                credential,
                rotation_id: Uuid::new_v4(),
            },
            provisioned_at: Utc::now(),
        };

        info!(
            schema = %safe_schema.schema,
            views = safe_schema.views.len(),
            role = %safe_schema.principal.role,
            rotation_id = %safe_schema.principal.rotation_id,
            catalog_version = %safe_schema.catalog_version,
            "safe schema provisioned"
        );
        Ok(safe_schema)
    }

    async fn apply(&self, plan: &ProvisionPlan, credential: &Credential) -> Result<(), ProvisionError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("qgate:provision:{}", plan.schema))
            .execute(&mut *tx)
            .await?;

        let role_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_catalog.pg_roles WHERE rolname = $1)")
                .bind(&plan.principal)
                .fetch_one(&mut *tx)
                .await?;
        if !role_exists {
            info!(role = %plan.principal, "creating restricted role");
            sqlx::query(&plan.create_role_statement()?)
                .execute(&mut *tx)
                .await?;
        }

        for statement in plan.statements() {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query(&plan.credential_statement(credential)?)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_principal_omits_credential() {
        let principal = RestrictedPrincipal {
            role: "hr_reader".to_string(),
            credential: Credential::from_secret("hunter2"),
            rotation_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&principal).unwrap();
        assert_eq!(json["role"], "hr_reader");
        assert!(json.get("credential").is_none());
        assert!(!json.to_string().contains("hunter2"));
        assert!(!format!("{:?}", principal).contains("hunter2"));
    }
}
