//! Column inference over a list of JSON rows
//!
//! Scans every row once and records each key the first time it is seen with
//! a non-null value. Nested objects and arrays do not become columns: they are
//! copied out as sub-tables for the loader to process first.

use crate::load::LoaderConfig;
use crate::report::{Diagnostic, Diagnostics};
use crate::schema::types::{classify, Classification, ColumnSpec};
use crate::value::JsonValue;
use std::collections::HashSet;

/// Rows found nested under one parent row
#[derive(Debug, Clone, PartialEq)]
pub struct SubTable {
    pub name: String,
    pub rows: Vec<JsonValue>,
}

/// Result of scanning one table's rows
#[derive(Debug, Clone, PartialEq)]
pub struct InferredTable {
    pub name: String,

    /// Columns in first-discovery order
    pub columns: Vec<ColumnSpec>,

    /// Nested tables in discovery order
    pub sub_tables: Vec<SubTable>,
}

impl InferredTable {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Infer the columns of `table` from its rows.
///
/// A key's type is fixed by its first non-null value. Keys whose first
/// non-null value cannot be stored are reported and excluded for the rest of
/// the scan. Every row that holds a nested value under its own id yields a
/// separate sub-table named `<table>_<id>_<key>`.
pub fn infer_columns(
    table: &str,
    rows: &[JsonValue],
    config: &LoaderConfig,
    diagnostics: &mut Diagnostics,
) -> InferredTable {
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns = Vec::new();
    let mut sub_tables = Vec::new();

    for row in rows {
        let Some(obj) = row.as_object() else {
            diagnostics.report(Diagnostic::NonObjectRow {
                table: table.to_string(),
                kind: row.kind().to_string(),
            });
            continue;
        };

        let parent_id = obj.get(&config.id_field).filter(|id| !id.is_null());

        for (key, value) in obj.iter() {
            if seen.contains(key) {
                continue;
            }

            match classify(value) {
                Classification::Null => {}
                Classification::Column(column_type) => {
                    columns.push(ColumnSpec::new(key, column_type));
                    seen.insert(key.to_string());
                }
                Classification::NestedObject | Classification::NestedArray => match parent_id {
                    // Not marked seen: each row decomposes its own nested value
                    Some(id) => sub_tables.push(SubTable {
                        name: config.sub_table_name(table, &id.name_fragment(), key),
                        rows: nested_rows(value, config),
                    }),
                    None => {
                        diagnostics.report(Diagnostic::NestedWithoutId {
                            table: table.to_string(),
                            key: key.to_string(),
                        });
                        seen.insert(key.to_string());
                    }
                },
                Classification::Unrepresentable => {
                    diagnostics.report(Diagnostic::UnrepresentableValue {
                        table: table.to_string(),
                        key: key.to_string(),
                        kind: value.kind().to_string(),
                    });
                    seen.insert(key.to_string());
                }
            }
        }
    }

    InferredTable {
        name: table.to_string(),
        columns,
        sub_tables,
    }
}

/// Copy a nested value out as sub-table rows.
///
/// An object of `code -> row` becomes a list of rows, each carrying its former
/// key in the configured code field. Arrays are taken as they are.
fn nested_rows(value: &JsonValue, config: &LoaderConfig) -> Vec<JsonValue> {
    match value {
        JsonValue::Object(obj) => obj
            .iter()
            .map(|(code, entry)| match entry {
                JsonValue::Object(inner) => {
                    let mut inner = inner.clone();
                    inner.insert(config.code_field.clone(), JsonValue::Text(code.to_string()));
                    JsonValue::Object(inner)
                }
                other => other.clone(),
            })
            .collect(),
        JsonValue::Array(arr) => arr.clone(),
        _ => Vec::new(),
    }
}
