//! Relational store capability
//!
//! The loader only talks to the database through [`RelationalStore`], so the
//! same load can run against SQLite or the in-memory [`MemoryStore`].

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::schema::ColumnSpec;
use std::path::PathBuf;
use thiserror::Error;

/// A column of a table as the store reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingColumn {
    pub name: String,
    /// Declared type text, e.g. "INTEGER"
    pub declared_type: String,
}

impl ExistingColumn {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        ExistingColumn {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// A value bound to one column of one row
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("failed to execute SQL statement: {source}")]
    Execute { source: rusqlite::Error },

    #[error("failed to read metadata of table {table}: {source}")]
    Query {
        table: String,
        source: rusqlite::Error,
    },

    #[error("table {0} does not exist")]
    MissingTable(String),

    #[error("table {0} already exists")]
    TableExists(String),

    #[error("table {table} has no column {column}")]
    UnknownColumn { table: String, column: String },

    #[error("row has {actual} values but {expected} columns were given")]
    ArityMismatch { expected: usize, actual: usize },
}

/// Operations the loader needs from a relational database.
///
/// Writes become durable only on [`commit`](RelationalStore::commit).
pub trait RelationalStore {
    /// Columns of `table` in declaration order, or `None` if it does not exist
    fn table_columns(&self, table: &str) -> Result<Option<Vec<ExistingColumn>>, StoreError>;

    fn create_table(&mut self, table: &str, columns: &[ColumnSpec]) -> Result<(), StoreError>;

    fn drop_table(&mut self, table: &str) -> Result<(), StoreError>;

    /// Insert rows, replacing any row with the same primary key. Values are
    /// bound positionally against `columns`. Returns the number of rows written.
    fn upsert(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Vec<SqlValue>],
    ) -> Result<usize, StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard everything written since the last commit
    fn rollback(&mut self) -> Result<(), StoreError>;
}
