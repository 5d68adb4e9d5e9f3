//! ingot-load: Build a SQLite database from saved API payloads
//!
//! Every collection is read from `<scrape-dir>/<name><suffix>`, its rows are
//! taken from the payload's data key, and they are loaded into a table of the
//! same name (plus one table per nested object or array). Each collection is
//! committed on its own.
//!
//! Usage:
//!   # Load the default collections with default paths
//!   ingot-load
//!
//!   # Load selected collections into a specific database
//!   ingot-load cards packs --database ./Output/cards.db
//!
//!   # Read settings from a JSON config file, overriding the scrape folder
//!   ingot-load --config ingot.json --scrape-dir ./scrapes
//!
//! Set RUST_LOG=debug to see every table and statement.

// Use MiMalloc allocator for better performance
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ingot::{build_database, RunConfig, SqliteStore};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ingot-load")]
#[command(about = "Load JSON API payloads into a SQLite database", long_about = None)]
struct Args {
    /// Collections to load (defaults to the configured list)
    #[arg(value_name = "COLLECTION")]
    collections: Vec<String>,

    /// JSON config file with `ingest` and `loader` sections
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Folder holding the saved payloads
    #[arg(long)]
    scrape_dir: Option<PathBuf>,

    /// Payload file suffix (default: ".ndb")
    #[arg(long)]
    suffix: Option<String>,

    /// Key holding the list of rows in each payload (default: "data")
    #[arg(long)]
    data_key: Option<String>,

    /// SQLite database to write
    #[arg(long, short = 'd')]
    database: Option<PathBuf>,

    /// Separator used in sub-table names (default: "_")
    #[arg(long)]
    separator: Option<String>,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();

    // Build config
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    if !args.collections.is_empty() {
        config.ingest.collections = args.collections;
    }
    if let Some(dir) = args.scrape_dir {
        config.ingest.scrape_dir = dir;
    }
    if let Some(suffix) = args.suffix {
        config.ingest.scrape_suffix = suffix;
    }
    if let Some(key) = args.data_key {
        config.ingest.data_key = key;
    }
    if let Some(database) = args.database {
        config.ingest.database = database;
    }
    if let Some(sep) = args.separator {
        config.loader.separator = sep;
    }

    let database = &config.ingest.database;
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create folder {}", parent.display()))?;
    }

    info!(database = %database.display(), "building database tables");
    let mut store = SqliteStore::open(database)?;
    let summary = build_database(&mut store, &config.ingest, &config.loader)?;

    for (collection, report) in &summary.loaded {
        if !report.diagnostics.is_empty() {
            warn!(
                collection = %collection,
                warnings = report.diagnostics.len(),
                "loaded with warnings"
            );
        }
    }

    if !summary.is_success() {
        let failed: Vec<&str> = summary.failed.iter().map(|(name, _)| name.as_str()).collect();
        bail!("failed to load collections: {}", failed.join(", "));
    }

    info!(collections = summary.loaded.len(), "database complete");
    Ok(())
}
