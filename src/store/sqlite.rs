//! SQLite-backed store

use crate::schema::ColumnSpec;
use crate::store::{ExistingColumn, RelationalStore, SqlValue, StoreError};
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

/// A SQLite database.
///
/// Writes are grouped in a transaction that is opened by the first write after
/// a commit and closed by [`commit`](RelationalStore::commit) or
/// [`rollback`](RelationalStore::rollback).
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".into(),
            source,
        })?;
        Ok(SqliteStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn execute(&self, sql: &str) -> Result<(), StoreError> {
        debug!(sql, "execute");
        self.conn
            .execute_batch(sql)
            .map_err(|source| StoreError::Execute { source })
    }

    fn begin_if_needed(&self) -> Result<(), StoreError> {
        if self.conn.is_autocommit() {
            self.execute("BEGIN IMMEDIATE")?;
        }
        Ok(())
    }
}

/// Quote an identifier so any table or column name can be used verbatim
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_definition(column: &ColumnSpec) -> String {
    let mut definition = format!("{} {}", quote_ident(&column.name), column.column_type);
    if let Some(constraint) = &column.constraint {
        definition.push(' ');
        definition.push_str(constraint);
    }
    definition
}

impl RelationalStore for SqliteStore {
    fn table_columns(&self, table: &str) -> Result<Option<Vec<ExistingColumn>>, StoreError> {
        let query_err = |source| StoreError::Query {
            table: table.to_string(),
            source,
        };

        let exists = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(query_err)?;

        if exists.is_none() {
            return Ok(None);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")
            .map_err(query_err)?;

        let columns = stmt
            .query_map(params![table], |row| {
                Ok(ExistingColumn {
                    name: row.get(0)?,
                    declared_type: row.get(1)?,
                })
            })
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;

        Ok(Some(columns))
    }

    fn create_table(&mut self, table: &str, columns: &[ColumnSpec]) -> Result<(), StoreError> {
        self.begin_if_needed()?;
        let definitions: Vec<String> = columns.iter().map(column_definition).collect();
        self.execute(&format!(
            "CREATE TABLE {} ({})",
            quote_ident(table),
            definitions.join(", ")
        ))
    }

    fn drop_table(&mut self, table: &str) -> Result<(), StoreError> {
        self.begin_if_needed()?;
        self.execute(&format!("DROP TABLE {}", quote_ident(table)))
    }

    fn upsert(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Vec<SqlValue>],
    ) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.begin_if_needed()?;

        let column_list: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            quote_ident(table),
            column_list.join(", "),
            placeholders
        );

        let mut stmt = self
            .conn
            .prepare_cached(&sql)
            .map_err(|source| StoreError::Execute { source })?;

        for row in rows {
            if row.len() != columns.len() {
                return Err(StoreError::ArityMismatch {
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
            stmt.execute(params_from_iter(row.iter()))
                .map_err(|source| StoreError::Execute { source })?;
        }

        Ok(rows.len())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.conn.is_autocommit() {
            self.execute("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.conn.is_autocommit() {
            self.execute("ROLLBACK")?;
        }
        Ok(())
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            SqlValue::Null => ValueRef::Null,
            SqlValue::Integer(i) => ValueRef::Integer(*i),
            SqlValue::Real(f) => ValueRef::Real(*f),
            SqlValue::Text(s) => ValueRef::Text(s.as_bytes()),
            SqlValue::Blob(b) => ValueRef::Blob(b),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

impl FromSql for SqlValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        })
    }
}
