use crate::load::config::LoaderConfig;
use crate::load::rows::bind_rows;
use crate::report::{Diagnostic, LoadReport};
use crate::schema::{infer_columns, reconcile, ColumnSpec, Reconciliation};
use crate::store::{RelationalStore, StoreError};
use crate::value::JsonValue;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("store failure while loading table {table}")]
    Store {
        table: String,
        #[source]
        source: StoreError,
    },
}

impl LoadError {
    pub fn table(&self) -> &str {
        match self {
            LoadError::Store { table, .. } => table,
        }
    }
}

/// Loads named collections of JSON rows into a relational store.
///
/// Each call infers the table's columns, loads every nested sub-table first
/// (depth first), reconciles the columns with any existing table, creates the
/// table if needed and upserts the rows. Nothing is committed; the caller
/// commits once a collection is complete.
pub struct TableLoader<'a, S: RelationalStore> {
    store: &'a mut S,
    config: &'a LoaderConfig,
    report: LoadReport,
}

impl<'a, S: RelationalStore> TableLoader<'a, S> {
    pub fn new(store: &'a mut S, config: &'a LoaderConfig) -> Self {
        TableLoader {
            store,
            config,
            report: LoadReport::default(),
        }
    }

    /// Load a value that should be a list of rows
    pub fn load_value(&mut self, table: &str, value: &JsonValue) -> Result<(), LoadError> {
        match value.as_array() {
            Some(rows) => self.load(table, rows),
            None => {
                self.report.diagnostics.report(Diagnostic::NotAList {
                    table: table.to_string(),
                    kind: value.kind().to_string(),
                });
                Ok(())
            }
        }
    }

    pub fn load(&mut self, table: &str, rows: &[JsonValue]) -> Result<(), LoadError> {
        debug!(table, rows = rows.len(), "loading table");

        let inferred = infer_columns(table, rows, self.config, &mut self.report.diagnostics);

        for sub_table in &inferred.sub_tables {
            self.load(&sub_table.name, &sub_table.rows)?;
        }

        if inferred.columns.is_empty() {
            self.report.diagnostics.report(Diagnostic::EmptySchema {
                table: table.to_string(),
            });
            return Ok(());
        }

        let store_err = |source| LoadError::Store {
            table: table.to_string(),
            source,
        };

        let columns = self.materialize(table, inferred.columns).map_err(store_err)?;
        let names: Vec<String> = columns.into_iter().map(|c| c.name).collect();
        let tuples = bind_rows(table, &names, rows, &mut self.report.diagnostics);
        let written = self.store.upsert(table, &names, &tuples).map_err(store_err)?;

        self.report.rows_written += written;
        debug!(table, rows = written, "table loaded");
        Ok(())
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn finish(self) -> LoadReport {
        self.report
    }

    /// Make sure `table` exists with the desired columns and return them in the
    /// order the table declares them
    fn materialize(
        &mut self,
        table: &str,
        desired: Vec<ColumnSpec>,
    ) -> Result<Vec<ColumnSpec>, StoreError> {
        let existing = self.store.table_columns(table)?;

        match reconcile(&desired, existing.as_deref()) {
            Reconciliation::Reuse(aligned) => {
                debug!(table, "reusing existing table");
                self.report.tables_reused.push(table.to_string());
                Ok(aligned)
            }
            Reconciliation::Create => {
                let columns = self.create_table(table, desired)?;
                self.report.tables_created.push(table.to_string());
                Ok(columns)
            }
            Reconciliation::Rebuild => {
                self.report.diagnostics.report(Diagnostic::IncompatibleSchema {
                    table: table.to_string(),
                });
                self.store.drop_table(table)?;
                let columns = self.create_table(table, desired)?;
                self.report.tables_rebuilt.push(table.to_string());
                Ok(columns)
            }
        }
    }

    fn create_table(
        &mut self,
        table: &str,
        desired: Vec<ColumnSpec>,
    ) -> Result<Vec<ColumnSpec>, StoreError> {
        let columns: Vec<ColumnSpec> = desired
            .into_iter()
            .map(|column| match self.config.constraint_for(&column.name) {
                Some(constraint) => column.with_constraint(constraint),
                None => column,
            })
            .collect();

        self.store.create_table(table, &columns)?;
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use crate::store::{MemoryStore, SqlValue, SqliteStore};
    use serde_json::json;

    fn rows(value: serde_json::Value) -> Vec<JsonValue> {
        JsonValue::from(value).as_array().unwrap().to_vec()
    }

    fn load(store: &mut MemoryStore, table: &str, value: serde_json::Value) -> LoadReport {
        let config = LoaderConfig::default();
        let mut loader = TableLoader::new(store, &config);
        loader.load(table, &rows(value)).unwrap();
        loader.finish()
    }

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(s.to_string())
    }

    #[test]
    fn test_creates_table_with_code_primary_key() {
        let mut store = MemoryStore::new();
        let report = load(&mut store, "types", json!([{"code": "agenda", "name": "Agenda"}]));

        assert_eq!(report.tables_created, vec!["types"]);
        assert_eq!(report.rows_written, 1);
        assert_eq!(
            store.columns("types").unwrap(),
            &[
                ColumnSpec::new("code", ColumnType::Text).with_constraint("PRIMARY KEY"),
                ColumnSpec::new("name", ColumnType::Text),
            ]
        );
    }

    #[test]
    fn test_loading_twice_is_idempotent() {
        let mut store = MemoryStore::new();
        let data = json!([
            {"code": "01001", "title": "Noise"},
            {"code": "01002", "title": "Déjà Vu"}
        ]);

        load(&mut store, "cards", data.clone());
        let report = load(&mut store, "cards", data);

        assert_eq!(report.tables_reused, vec!["cards"]);
        assert_eq!(store.rows("cards").unwrap().len(), 2);
        assert_eq!(store.drop_count("cards"), 0);
    }

    #[test]
    fn test_reordered_discovery_reuses_table() {
        let mut store = MemoryStore::new();
        load(&mut store, "t", json!([{"A": 1, "B": "x"}]));
        let report = load(&mut store, "t", json!([{"B": "y", "A": 2}]));

        assert_eq!(report.tables_reused, vec!["t"]);
        assert_eq!(store.drop_count("t"), 0);
        assert_eq!(store.column_values("t", "A").unwrap(), vec![SqlValue::Integer(1), SqlValue::Integer(2)]);
        assert_eq!(store.column_values("t", "B").unwrap(), vec![text("x"), text("y")]);
    }

    #[test]
    fn test_incompatible_schema_rebuilds_table() {
        let mut store = MemoryStore::new();
        load(&mut store, "t", json!([{"A": 1, "B": "x"}]));
        let report = load(&mut store, "t", json!([{"A": 2, "C": "z"}]));

        assert_eq!(report.tables_rebuilt, vec!["t"]);
        assert_eq!(store.drop_count("t"), 1);
        assert_eq!(store.rows("t").unwrap(), &[vec![SqlValue::Integer(2), text("z")]]);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::IncompatibleSchema { table } if table == "t")));
    }

    #[test]
    fn test_nested_object_sub_table() {
        let mut store = MemoryStore::new();
        load(
            &mut store,
            "cards",
            json!([{"id": 5, "meta": {"x": {"v": 1}, "y": {"v": 2}}}]),
        );

        assert_eq!(store.table_names(), vec!["cards", "cards_5_meta"]);
        assert_eq!(store.column_values("cards_5_meta", "code").unwrap(), vec![text("x"), text("y")]);
        assert_eq!(
            store.column_values("cards_5_meta", "v").unwrap(),
            vec![SqlValue::Integer(1), SqlValue::Integer(2)]
        );
        assert!(store.columns("cards").unwrap().iter().all(|c| c.name != "meta"));
    }

    #[test]
    fn test_nested_array_sub_table() {
        let mut store = MemoryStore::new();
        load(&mut store, "packs", json!([{"id": 7, "tags": [{"name": "a"}, {"name": "b"}]}]));

        assert_eq!(store.column_values("packs_7_tags", "name").unwrap(), vec![text("a"), text("b")]);
    }

    #[test]
    fn test_deeply_nested_names_compose() {
        let mut store = MemoryStore::new();
        load(
            &mut store,
            "cycles",
            json!([{"id": 1, "packs": [{"id": 2, "cards": [{"title": "Corroder"}]}]}]),
        );

        assert_eq!(
            store.column_values("cycles_1_packs_2_cards", "title").unwrap(),
            vec![text("Corroder")]
        );
        assert_eq!(store.column_values("cycles_1_packs", "id").unwrap(), vec![SqlValue::Integer(2)]);
    }

    #[test]
    fn test_missing_key_stored_as_null() {
        let mut store = MemoryStore::new();
        load(&mut store, "cards", json!([{"id": 1, "n": 5}, {"id": 2}]));

        assert_eq!(
            store.column_values("cards", "n").unwrap(),
            vec![SqlValue::Integer(5), SqlValue::Null]
        );
    }

    #[test]
    fn test_unrepresentable_value_does_not_abort() {
        let mut store = MemoryStore::new();
        let report = load(
            &mut store,
            "cards",
            json!([{"code": "01001", "odd": u64::MAX, "title": "Gordian Blade"}]),
        );

        assert_eq!(report.diagnostics.len(), 1);
        let names: Vec<&str> = store.columns("cards").unwrap().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["code", "title"]);
        assert_eq!(report.rows_written, 1);
    }

    #[test]
    fn test_non_list_value_is_reported() {
        let mut store = MemoryStore::new();
        let config = LoaderConfig::default();
        let mut loader = TableLoader::new(&mut store, &config);
        loader
            .load_value("mwl", &JsonValue::from(json!({"code": "x"})))
            .unwrap();

        let report = loader.finish();
        assert!(matches!(
            report.diagnostics.iter().next(),
            Some(Diagnostic::NotAList { kind, .. }) if kind == "object"
        ));
        assert!(store.table_names().is_empty());
    }

    #[test]
    fn test_empty_rows_leave_existing_table() {
        let mut store = MemoryStore::new();
        load(&mut store, "cards", json!([{"code": "01001"}]));
        let report = load(&mut store, "cards", json!([]));

        assert_eq!(report.table_count(), 0);
        assert_eq!(store.rows("cards").unwrap().len(), 1);
    }

    #[test]
    fn test_custom_policy() {
        let mut store = MemoryStore::new();
        let mut config = LoaderConfig::default();
        config.separator = "__".to_string();
        config.code_field = "key".to_string();
        config.column_constraints.clear();
        config.column_constraints.insert("key".to_string(), "PRIMARY KEY".to_string());

        let mut loader = TableLoader::new(&mut store, &config);
        loader
            .load("cards", &rows(json!([{"id": 3, "meta": {"x": {"v": 1}}}])))
            .unwrap();

        let columns = store.columns("cards__3__meta").unwrap();
        assert!(columns.iter().any(|c| c.name == "key" && c.is_primary_key()));
    }

    #[test]
    fn test_store_failure_names_table() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch("CREATE VIEW cards AS SELECT 1 AS code")
            .unwrap();

        let config = LoaderConfig::default();
        let mut loader = TableLoader::new(&mut store, &config);
        let err = loader.load("cards", &rows(json!([{"code": "x"}]))).unwrap_err();
        assert_eq!(err.table(), "cards");
    }

    #[test]
    fn test_sqlite_rebuild_keeps_only_new_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let config = LoaderConfig::default();

        {
            let mut loader = TableLoader::new(&mut store, &config);
            loader.load("t", &rows(json!([{"A": 1, "B": "x"}]))).unwrap();
        }
        store.commit().unwrap();

        {
            let mut loader = TableLoader::new(&mut store, &config);
            loader.load("t", &rows(json!([{"A": 2, "C": "z"}]))).unwrap();
            assert_eq!(loader.report().tables_rebuilt, vec!["t"]);
        }
        store.commit().unwrap();

        let rows: Vec<(i64, String)> = store
            .connection()
            .prepare("SELECT A, C FROM t")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows, vec![(2, "z".to_string())]);
    }

    #[test]
    fn test_sqlite_reorder_and_upsert() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let config = LoaderConfig::default();

        for data in [
            json!([{"code": "01001", "cost": 0}, {"code": "01002", "cost": 2}]),
            json!([{"cost": 4, "code": "01001"}]),
        ] {
            let mut loader = TableLoader::new(&mut store, &config);
            loader.load("cards", &rows(data)).unwrap();
            store.commit().unwrap();
        }

        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))
            .unwrap();
        let cost: i64 = store
            .connection()
            .query_row("SELECT cost FROM cards WHERE code = '01001'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(cost, 4);
    }
}
