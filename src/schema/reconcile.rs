//! Schema reconciliation against an existing table
//!
//! Column discovery order depends on the order keys happen to appear in a
//! payload, so two loads of the same data can infer the same columns in a
//! different order. Such a schema is realigned to the table that already
//! exists; any other difference means the table is rebuilt.

use crate::schema::types::{ColumnSpec, ColumnType};
use crate::store::ExistingColumn;

/// What to do with the table before loading rows into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// No table exists yet
    Create,
    /// The existing table matches; columns are reordered to its layout
    Reuse(Vec<ColumnSpec>),
    /// The existing table does not match and must be dropped and recreated
    Rebuild,
}

pub fn reconcile(desired: &[ColumnSpec], existing: Option<&[ExistingColumn]>) -> Reconciliation {
    let Some(existing) = existing else {
        return Reconciliation::Create;
    };

    let mut aligned = desired.to_vec();
    if align_to_existing(&mut aligned, existing) {
        Reconciliation::Reuse(aligned)
    } else {
        Reconciliation::Rebuild
    }
}

/// Reorder `columns` in place to match `existing` position by position.
///
/// For each existing column `i`, the match is searched from position `i`
/// onwards in `columns` and swapped into place. Returns false as soon as a
/// position has no match, or when the lengths differ. With unique column
/// names on both sides this accepts exactly the permutations of `existing`.
pub fn align_to_existing(columns: &mut [ColumnSpec], existing: &[ExistingColumn]) -> bool {
    if columns.len() != existing.len() {
        return false;
    }

    for (i, target) in existing.iter().enumerate() {
        let found = columns[i..]
            .iter()
            .position(|column| matches_existing(column, target))
            .map(|offset| i + offset);

        match found {
            Some(j) => columns.swap(i, j),
            None => return false,
        }
    }

    true
}

fn matches_existing(column: &ColumnSpec, existing: &ExistingColumn) -> bool {
    column.name == existing.name
        && ColumnType::from_declared(&existing.declared_type) == Some(column.column_type)
}
