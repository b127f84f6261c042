//! `qgate provision`: create or replace the safe schema.

use anyhow::{Context, Result};
use std::path::Path;

use qgate_provision::{ProvisionPlan, RestrictedPrincipal};

use super::{connect, write_file};

pub async fn run(config_path: &Path, dry_run: bool, credentials_out: Option<&Path>) -> Result<()> {
    let gateway = connect(config_path).await?;

    if dry_run {
        let catalog = gateway
            .build_catalog()
            .await
            .context("Failed to build catalog")?;
        let plan = ProvisionPlan::build(&catalog, &gateway.config().safe_schema)?;
        println!("-- catalog version {}", catalog.schema_version);
        println!("-- when the role does not exist yet");
        println!("{};", plan.create_role_statement()?);
        print!("{}", plan.script());
        return Ok(());
    }

    let snapshot = gateway
        .reprovision()
        .await
        .context("Failed to provision safe schema")?;
    let safe_schema = &snapshot.safe_schema;

    println!(
        "Provisioned schema '{}' with {} view(s) for role '{}'",
        safe_schema.schema,
        safe_schema.views.len(),
        safe_schema.principal.role
    );
    println!("Catalog version: {}", safe_schema.catalog_version);
    for grant in &safe_schema.grants {
        println!("  GRANT {}", grant);
    }

    match credentials_out {
        Some(path) => {
            write_file(path, &credentials_file(&safe_schema.principal))?;
            restrict_permissions(path)?;
            println!("Credentials written to {}", path.display());
        }
        None => println!(
            "Credential rotated (rotation {}); pass --credentials-out to keep it",
            safe_schema.principal.rotation_id
        ),
    }
    Ok(())
}

fn credentials_file(principal: &RestrictedPrincipal) -> String {
    format!(
        "QGATE_RESTRICTED_ROLE={}\nQGATE_RESTRICTED_PASSWORD={}\nQGATE_ROTATION_ID={}\n",
        principal.role,
        principal.credential.expose(),
        principal.rotation_id
    )
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
