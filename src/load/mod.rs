//! Loading JSON collections into relational tables
//!
//! [`TableLoader`] drives inference, reconciliation, table creation and bulk
//! upserts for one collection and every sub-table nested inside it.

pub mod config;
pub mod driver;
pub mod rows;

pub use config::LoaderConfig;
pub use driver::{LoadError, TableLoader};
pub use rows::bind_rows;
