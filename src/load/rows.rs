//! Binding JSON rows to a fixed column order

use crate::report::{Diagnostic, Diagnostics};
use crate::store::SqlValue;
use crate::value::JsonValue;

/// Build one value tuple per object row, in `columns` order.
///
/// Absent keys bind NULL. Rows that are not objects were already reported by
/// column inference and are skipped here.
pub fn bind_rows(
    table: &str,
    columns: &[String],
    rows: &[JsonValue],
    diagnostics: &mut Diagnostics,
) -> Vec<Vec<SqlValue>> {
    let mut tuples = Vec::with_capacity(rows.len());

    for obj in rows.iter().filter_map(JsonValue::as_object) {
        let mut tuple = Vec::with_capacity(columns.len());
        for column in columns {
            let value = match obj.get(column) {
                None => SqlValue::Null,
                Some(value) => to_sql_value(value).unwrap_or_else(|| {
                    diagnostics.report(Diagnostic::UnbindableValue {
                        table: table.to_string(),
                        column: column.clone(),
                        kind: value.kind().to_string(),
                    });
                    SqlValue::Null
                }),
            };
            tuple.push(value);
        }
        tuples.push(tuple);
    }

    tuples
}

/// Scalar values only; nested and unsupported values have no column form
fn to_sql_value(value: &JsonValue) -> Option<SqlValue> {
    match value {
        JsonValue::Null => Some(SqlValue::Null),
        JsonValue::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        JsonValue::Integer(i) => Some(SqlValue::Integer(*i)),
        JsonValue::Real(f) => Some(SqlValue::Real(*f)),
        JsonValue::Text(s) => Some(SqlValue::Text(s.clone())),
        JsonValue::Blob(b) => Some(SqlValue::Blob(b.clone())),
        JsonValue::Object(_) | JsonValue::Array(_) | JsonValue::Unsupported { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: serde_json::Value) -> Vec<JsonValue> {
        JsonValue::from(value).as_array().unwrap().to_vec()
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_missing_keys_bind_null() {
        let mut diagnostics = Diagnostics::new();
        let tuples = bind_rows(
            "cards",
            &columns(&["id", "n"]),
            &rows(json!([{"id": 1, "n": 5}, {"id": 2}])),
            &mut diagnostics,
        );

        assert_eq!(
            tuples,
            vec![
                vec![SqlValue::Integer(1), SqlValue::Integer(5)],
                vec![SqlValue::Integer(2), SqlValue::Null],
            ]
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_scalar_conversion() {
        let mut diagnostics = Diagnostics::new();
        let tuples = bind_rows(
            "cards",
            &columns(&["flag", "ratio", "title"]),
            &rows(json!([{"title": "Sure Gamble", "flag": true, "ratio": 0.25}])),
            &mut diagnostics,
        );

        assert_eq!(
            tuples[0],
            vec![
                SqlValue::Integer(1),
                SqlValue::Real(0.25),
                SqlValue::Text("Sure Gamble".into()),
            ]
        );
    }

    #[test]
    fn test_nested_value_in_column_binds_null() {
        let mut diagnostics = Diagnostics::new();
        let tuples = bind_rows(
            "cards",
            &columns(&["faction"]),
            &rows(json!([{"faction": "anarch"}, {"faction": {"code": "anarch"}}, "stray"])),
            &mut diagnostics,
        );

        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples[1], vec![SqlValue::Null]);
        assert_eq!(diagnostics.len(), 1);
    }
}
