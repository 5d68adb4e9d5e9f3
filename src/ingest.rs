//! Building a database from saved API payloads
//!
//! Each collection was fetched into `<scrape_dir>/<name><suffix>` as a JSON
//! document whose rows sit under a data key. Collections are loaded one at a
//! time and committed individually, so a failure in one does not undo the
//! others.

use crate::load::{LoaderConfig, TableLoader};
use crate::report::LoadReport;
use crate::store::RelationalStore;
use crate::value::JsonValue;
use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, info};

// Collection names end up in file paths and table names
static COLLECTION_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]*$").unwrap()
});

/// Where payloads live and which collections to load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub scrape_dir: PathBuf,
    pub scrape_suffix: String,

    /// Top-level key holding the list of rows in each payload
    pub data_key: String,

    pub database: PathBuf,

    /// Collections to load, in order
    pub collections: Vec<String>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        IngestSettings {
            scrape_dir: PathBuf::from("./Intermediate/Scrapes/"),
            scrape_suffix: String::from(".ndb"),
            data_key: String::from("data"),
            database: PathBuf::from("./Output/NetrunnerDB.db"),
            collections: ["types", "cards", "packs", "cycles", "mwl"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Everything a run can be configured with, as read from a config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub ingest: IngestSettings,
    pub loader: LoaderConfig,
}

impl RunConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

pub fn validate_collection_name(name: &str) -> Result<()> {
    if !COLLECTION_NAME_REGEX.is_match(name) {
        bail!("invalid collection name `{}`", name);
    }
    Ok(())
}

pub fn payload_path(settings: &IngestSettings, collection: &str) -> PathBuf {
    settings
        .scrape_dir
        .join(format!("{}{}", collection, settings.scrape_suffix))
}

/// Read a payload file and return the value stored under `data_key`
pub fn read_payload(path: &Path, data_key: &str) -> Result<JsonValue> {
    let mut bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read payload {}", path.display()))?;

    let document: Value = simd_json::serde::from_slice(&mut bytes)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;

    let Value::Object(mut fields) = document else {
        bail!("payload {} is not a JSON object", path.display());
    };

    let data = fields
        .remove(data_key)
        .with_context(|| format!("payload {} has no `{}` key", path.display(), data_key))?;

    Ok(JsonValue::from(data))
}

/// Load one collection's payload into the table of the same name and commit
pub fn load_collection<S: RelationalStore>(
    store: &mut S,
    settings: &IngestSettings,
    config: &LoaderConfig,
    collection: &str,
) -> Result<LoadReport> {
    validate_collection_name(collection)?;

    let path = payload_path(settings, collection);
    let data = read_payload(&path, &settings.data_key)?;

    let mut loader = TableLoader::new(store, config);
    loader.load_value(collection, &data)?;
    let report = loader.finish();

    store
        .commit()
        .with_context(|| format!("Failed to commit collection {}", collection))?;

    Ok(report)
}

/// Per-collection outcome of [`build_database`]
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub loaded: Vec<(String, LoadReport)>,
    /// Collection name and the rendered error chain
    pub failed: Vec<(String, String)>,
}

impl BuildSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Load every configured collection, committing after each one.
///
/// A collection that fails is rolled back and recorded; the remaining
/// collections are still loaded. Only a failed rollback aborts the build.
pub fn build_database<S: RelationalStore>(
    store: &mut S,
    settings: &IngestSettings,
    config: &LoaderConfig,
) -> Result<BuildSummary> {
    let mut summary = BuildSummary::default();

    for collection in &settings.collections {
        info!(collection = %collection, "building table");

        match load_collection(store, settings, config, collection) {
            Ok(report) => {
                info!(
                    collection = %collection,
                    tables = report.table_count(),
                    rows = report.rows_written,
                    warnings = report.diagnostics.len(),
                    "complete"
                );
                summary.loaded.push((collection.clone(), report));
            }
            Err(err) => {
                let message = format!("{:#}", err);
                error!(collection = %collection, error = %message, "failed");
                store
                    .rollback()
                    .with_context(|| format!("Failed to roll back collection {}", collection))?;
                summary.failed.push((collection.clone(), message));
            }
        }
    }

    Ok(summary)
}
