//! Non-fatal problems found while loading
//!
//! Nothing here aborts a load, but nothing is dropped silently either: every
//! diagnostic is logged through `tracing` when it is recorded and kept so the
//! caller can inspect it afterwards.

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("could not map value of key `{key}` ({kind}) to a column type while parsing table {table}")]
    UnrepresentableValue {
        table: String,
        key: String,
        kind: String,
    },

    #[error("table {table} is not a list ({kind}) and could not be parsed")]
    NotAList { table: String, kind: String },

    #[error("table {table} contained a non-object entry ({kind}) which could not be parsed")]
    NonObjectRow { table: String, kind: String },

    #[error("nested value under key `{key}` in table {table} has no parent id and was dropped")]
    NestedWithoutId { table: String, key: String },

    #[error("value of column `{column}` ({kind}) in table {table} cannot be stored and was written as NULL")]
    UnbindableValue {
        table: String,
        column: String,
        kind: String,
    },

    #[error("table {table} has no columns to create; nothing was written")]
    EmptySchema { table: String },

    #[error("existing table {table} does not match the inferred columns; dropped and recreated")]
    IncompatibleSchema { table: String },
}

impl Diagnostic {
    pub fn table(&self) -> &str {
        match self {
            Diagnostic::UnrepresentableValue { table, .. }
            | Diagnostic::NotAList { table, .. }
            | Diagnostic::NonObjectRow { table, .. }
            | Diagnostic::NestedWithoutId { table, .. }
            | Diagnostic::UnbindableValue { table, .. }
            | Diagnostic::EmptySchema { table }
            | Diagnostic::IncompatibleSchema { table } => table,
        }
    }
}

/// Collects diagnostics for one load
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Log a diagnostic and keep it
    pub fn report(&mut self, diagnostic: Diagnostic) {
        warn!(table = diagnostic.table(), "{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

/// Outcome of loading one collection and all of its sub-tables
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub tables_created: Vec<String>,
    pub tables_reused: Vec<String>,
    pub tables_rebuilt: Vec<String>,
    pub rows_written: usize,
    pub diagnostics: Diagnostics,
}

impl LoadReport {
    /// Tables materialized, counting each load of the same table
    pub fn table_count(&self) -> usize {
        self.tables_created.len() + self.tables_reused.len() + self.tables_rebuilt.len()
    }
}
