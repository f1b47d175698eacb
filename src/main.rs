use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use datatable_list::config::{default_db_path, DataTableConfig};
use datatable_list::infra::sqlite::source::{SqliteSource, SqliteSourceConfig};
use datatable_list::infra::templates::NoTemplates;
use datatable_list::infra::translation::IdentityTranslator;
use datatable_list::DataTableService;

/// Answers one data table request against an SQLite database.
#[derive(Parser, Debug)]
#[command(name = "datatable-list")]
struct Args {
    /// Source description (table, columns, joins) as JSON.
    #[arg(long)]
    source: PathBuf,

    /// Database file; defaults to the per-user data directory.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Request parameter bag as JSON, `-` for stdin.
    #[arg(long, default_value = "-")]
    request: String,

    /// Service settings as JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn read_request(request: &str) -> Result<Value> {
    let raw = if request == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read request from stdin")?;
        raw
    } else {
        std::fs::read_to_string(request)
            .with_context(|| format!("failed to read request: {request}"))?
    };
    serde_json::from_str(&raw).context("failed to parse request json")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("datatable_list=info,warn")),
        )
        .init();

    let args = Args::parse();
    let db_path = match args.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let config = match &args.config {
        Some(path) => DataTableConfig::from_json_file(path)?,
        None => DataTableConfig::default(),
    };

    let source = SqliteSource::open(&db_path, SqliteSourceConfig::from_json_file(&args.source)?)
        .with_context(|| format!("failed to open source on {}", db_path.display()))?;
    let service = DataTableService::new(
        Arc::new(source),
        Arc::new(NoTemplates),
        Arc::new(IdentityTranslator),
    )
    .with_config(config);

    let response = service.respond(&read_request(&args.request)?);
    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("failed to encode response")?
    );
    Ok(())
}
