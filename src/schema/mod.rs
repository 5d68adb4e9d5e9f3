//! Schema inference and reconciliation
//!
//! Infers a table's columns from its JSON rows and decides how that inferred
//! schema fits a table left behind by an earlier load.

pub mod types;
pub mod columns;
pub mod reconcile;

pub use types::{classify, Classification, ColumnSpec, ColumnType};
pub use columns::{infer_columns, InferredTable, SubTable};
pub use reconcile::{align_to_existing, reconcile, Reconciliation};
