//! `qgate catalog`: build the catalog without provisioning it.

use anyhow::{Context, Result};
use std::path::Path;

use qgate_catalog::render_markdown;

use super::{connect, write_file};

pub async fn run(
    config_path: &Path,
    out_json: Option<&Path>,
    out_document: Option<&Path>,
    out_md: Option<&Path>,
) -> Result<()> {
    let gateway = connect(config_path).await?;
    let catalog = gateway
        .build_catalog()
        .await
        .context("Failed to build catalog")?;

    let document = serde_json::to_string_pretty(&catalog.document())?;

    if let Some(path) = out_json {
        write_file(path, &catalog.to_json()?)?;
        println!("Catalog written to {}", path.display());
    }
    if let Some(path) = out_document {
        write_file(path, &document)?;
        println!("Catalog document written to {}", path.display());
    }
    if let Some(path) = out_md {
        write_file(path, &render_markdown(&catalog))?;
        println!("Catalog summary written to {}", path.display());
    }

    if out_json.is_none() && out_document.is_none() && out_md.is_none() {
        println!("{}", document);
    } else {
        println!(
            "{} view(s) in schema '{}', version {}",
            catalog.entries.len(),
            catalog.safe_schema,
            catalog.schema_version
        );
    }
    Ok(())
}
