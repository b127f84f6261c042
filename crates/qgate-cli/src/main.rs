use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "qgate", version, about = "Secure query gateway for generated SQL")]
struct Cli {
    /// Gateway configuration file
    #[arg(long, global = true, env = "QGATE_CONFIG", default_value = "qgate.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the catalog from the live schema and the sensitivity policy.
    Catalog {
        /// Write the full catalog (input for `validate --catalog`)
        #[arg(long = "out-json")]
        out_json: Option<PathBuf>,

        /// Write the outbound document handed to query generators
        #[arg(long = "out-document")]
        out_document: Option<PathBuf>,

        /// Write a markdown summary
        #[arg(long = "out-md")]
        out_md: Option<PathBuf>,
    },

    /// Create or replace the safe schema and rotate the restricted credential.
    Provision {
        /// Print the DDL instead of applying it
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Write the restricted role's credentials to this file
        #[arg(long = "credentials-out")]
        credentials_out: Option<PathBuf>,
    },

    /// Validate a candidate query offline against a saved catalog.
    Validate {
        /// Catalog JSON written by `qgate catalog --out-json`
        #[arg(long)]
        catalog: PathBuf,

        /// Requested row limit
        #[arg(long)]
        limit: Option<u64>,

        /// Mark the candidate as hand-written
        #[arg(long, default_value_t = false)]
        manual: bool,

        sql: String,
    },

    /// Provision, validate and execute one query.
    Query {
        #[arg(long)]
        limit: Option<u64>,

        #[arg(long, default_value_t = false)]
        manual: bool,

        sql: String,
    },

    /// Check configuration, and optionally a catalog document and the live schema.
    Check {
        /// Outbound catalog document to validate against its JSON schema
        #[arg(long)]
        document: Option<PathBuf>,

        /// Skip introspecting the database
        #[arg(long, default_value_t = false)]
        offline: bool,
    },

    /// Provision, then keep refreshing the catalog until interrupted.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Catalog {
            out_json,
            out_document,
            out_md,
        } => {
            commands::catalog::run(
                &cli.config,
                out_json.as_deref(),
                out_document.as_deref(),
                out_md.as_deref(),
            )
            .await?
        }
        Command::Provision {
            dry_run,
            credentials_out,
        } => commands::provision::run(&cli.config, dry_run, credentials_out.as_deref()).await?,
        Command::Validate {
            catalog,
            limit,
            manual,
            sql,
        } => commands::validate::run(&cli.config, &catalog, &sql, limit, manual)?,
        Command::Query { limit, manual, sql } => {
            commands::query::run(&cli.config, &sql, limit, manual).await?
        }
        Command::Check { document, offline } => {
            commands::check::run(&cli.config, document.as_deref(), offline).await?
        }
        Command::Watch => commands::watch::run(&cli.config).await?,
    }

    Ok(())
}
