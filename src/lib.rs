//! # Ingot - JSON collections into relational tables
//!
//! Loads lists of JSON objects into a relational store whose schema is not
//! known ahead of time. Columns are inferred from the data, nested objects and
//! arrays become their own tables, and tables left by earlier runs are reused
//! when their columns still match or rebuilt when they do not.
//!
//! ## Modules
//!
//! - **value**: the JSON value model the loader works on
//! - **schema**: type classification, column inference, schema reconciliation
//! - **store**: the relational store capability, SQLite and in-memory backends
//! - **load**: the recursive table loader and its configuration
//! - **ingest**: building a database from saved API payloads
//!
//! ## Quick Start
//!
//! ```rust
//! use ingot::{JsonValue, LoaderConfig, MemoryStore, RelationalStore, TableLoader};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let rows = JsonValue::from(json!([
//!     {"id": 5, "code": "01005", "title": "Mimic", "meta": {"x": {"v": 1}}},
//! ]));
//!
//! let mut store = MemoryStore::new();
//! let config = LoaderConfig::default();
//! let mut loader = TableLoader::new(&mut store, &config);
//! loader.load_value("cards", &rows)?;
//! let report = loader.finish();
//! store.commit()?;
//!
//! // "cards" holds id, code and title; "cards_5_meta" holds the nested rows
//! assert_eq!(report.tables_created, vec!["cards_5_meta", "cards"]);
//! # Ok(())
//! # }
//! ```

pub mod value;
pub mod report;
pub mod schema;
pub mod store;
pub mod load;
pub mod ingest;

// Re-export commonly used types for convenience
pub use value::{JsonObject, JsonValue};
pub use report::{Diagnostic, Diagnostics, LoadReport};
pub use schema::{ColumnSpec, ColumnType, Reconciliation};
pub use store::{MemoryStore, RelationalStore, SqlValue, SqliteStore, StoreError};
pub use load::{LoadError, LoaderConfig, TableLoader};
pub use ingest::{build_database, BuildSummary, IngestSettings, RunConfig};
