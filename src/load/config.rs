use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Naming and constraint policy for a load.
///
/// Passed explicitly to the loader so independent loads can use different
/// policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Separator between the parts of a sub-table name
    pub separator: String,

    /// Field whose value identifies a parent row in sub-table names
    pub id_field: String,

    /// Field injected into each row built from a nested object, holding the
    /// row's former key
    pub code_field: String,

    /// Constraint appended to any column with the given name, in any table
    pub column_constraints: BTreeMap<String, String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let mut column_constraints = BTreeMap::new();
        column_constraints.insert("code".to_string(), "PRIMARY KEY".to_string());

        LoaderConfig {
            separator: String::from("_"),
            id_field: String::from("id"),
            code_field: String::from("code"),
            column_constraints,
        }
    }
}

impl LoaderConfig {
    /// Name of the table holding the nested value found under `key` in the
    /// parent row identified by `parent_id`
    pub fn sub_table_name(&self, parent_table: &str, parent_id: &str, key: &str) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            parent_table,
            parent_id,
            key,
            sep = self.separator
        )
    }

    pub fn constraint_for(&self, column: &str) -> Option<&str> {
        self.column_constraints.get(column).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config = LoaderConfig::default();
        assert_eq!(config.sub_table_name("cards", "5", "meta"), "cards_5_meta");
        assert_eq!(config.constraint_for("code"), Some("PRIMARY KEY"));
        assert_eq!(config.constraint_for("id"), None);
    }

    #[test]
    fn test_partial_config_from_json() {
        let config: LoaderConfig =
            serde_json::from_str(r#"{"separator": "__", "column_constraints": {"id": "PRIMARY KEY"}}"#)
                .unwrap();

        assert_eq!(config.sub_table_name("packs", "7", "tags"), "packs__7__tags");
        assert_eq!(config.id_field, "id");
        assert_eq!(config.constraint_for("id"), Some("PRIMARY KEY"));
        assert_eq!(config.constraint_for("code"), None);
    }
}
