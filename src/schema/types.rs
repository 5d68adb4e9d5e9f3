use crate::value::JsonValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage type of a column, using SQLite type affinities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
}

impl ColumnType {
    pub fn as_sql(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
        }
    }

    /// Parse a declared column type as reported by the store.
    ///
    /// Only the four names this crate writes are recognised; anything else
    /// (`VARCHAR(20)`, an empty type) cannot match an inferred column.
    pub fn from_declared(declared: &str) -> Option<Self> {
        let declared = declared.trim();
        [
            ColumnType::Integer,
            ColumnType::Real,
            ColumnType::Text,
            ColumnType::Blob,
        ]
        .into_iter()
        .find(|t| t.as_sql().eq_ignore_ascii_case(declared))
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    /// Column-level constraint text, e.g. "PRIMARY KEY"
    pub constraint: Option<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnSpec {
            name: name.into(),
            column_type,
            constraint: None,
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraint
            .as_deref()
            .is_some_and(|c| c.to_ascii_uppercase().contains("PRIMARY KEY"))
    }
}

/// Outcome of classifying a single JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Never establishes a column type
    Null,
    Column(ColumnType),
    NestedObject,
    NestedArray,
    /// No column type exists for this value
    Unrepresentable,
}

/// Map a JSON value to the column type it would be stored as.
///
/// Booleans are stored as integers (0/1).
pub fn classify(value: &JsonValue) -> Classification {
    match value {
        JsonValue::Null => Classification::Null,
        JsonValue::Integer(_) | JsonValue::Bool(_) => Classification::Column(ColumnType::Integer),
        JsonValue::Real(_) => Classification::Column(ColumnType::Real),
        JsonValue::Text(_) => Classification::Column(ColumnType::Text),
        JsonValue::Blob(_) => Classification::Column(ColumnType::Blob),
        JsonValue::Object(_) => Classification::NestedObject,
        JsonValue::Array(_) => Classification::NestedArray,
        JsonValue::Unsupported { .. } => Classification::Unrepresentable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify_json(value: serde_json::Value) -> Classification {
        classify(&JsonValue::from(value))
    }

    #[test]
    fn test_scalar_classification() {
        assert_eq!(classify_json(json!(3)), Classification::Column(ColumnType::Integer));
        assert_eq!(classify_json(json!(true)), Classification::Column(ColumnType::Integer));
        assert_eq!(classify_json(json!(1.5)), Classification::Column(ColumnType::Real));
        assert_eq!(classify_json(json!("x")), Classification::Column(ColumnType::Text));
        assert_eq!(
            classify(&JsonValue::Blob(vec![1, 2])),
            Classification::Column(ColumnType::Blob)
        );
        assert_eq!(classify_json(json!(null)), Classification::Null);
    }

    #[test]
    fn test_nested_and_unrepresentable() {
        assert_eq!(classify_json(json!({"a": 1})), Classification::NestedObject);
        assert_eq!(classify_json(json!([1])), Classification::NestedArray);
        assert_eq!(classify_json(json!(u64::MAX)), Classification::Unrepresentable);
    }

    #[test]
    fn test_from_declared() {
        assert_eq!(ColumnType::from_declared("integer"), Some(ColumnType::Integer));
        assert_eq!(ColumnType::from_declared("TEXT"), Some(ColumnType::Text));
        assert_eq!(ColumnType::from_declared("VARCHAR(20)"), None);
    }

    #[test]
    fn test_primary_key_detection() {
        let col = ColumnSpec::new("code", ColumnType::Text).with_constraint("PRIMARY KEY");
        assert!(col.is_primary_key());
        assert!(!ColumnSpec::new("name", ColumnType::Text).is_primary_key());
    }
}
