//! In-memory store with the same contract as SQLite

use crate::schema::ColumnSpec;
use crate::store::{ExistingColumn, RelationalStore, SqlValue, StoreError};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
struct MemoryTable {
    columns: Vec<ColumnSpec>,
    rows: Vec<Vec<SqlValue>>,
}

impl MemoryTable {
    fn primary_key(&self) -> Option<usize> {
        self.columns.iter().position(ColumnSpec::is_primary_key)
    }
}

/// Keeps tables in memory with the same commit and upsert semantics as the
/// SQLite store: rows with an equal non-null primary key replace each other,
/// tables without one only ever grow.
#[derive(Debug, Default)]
pub struct MemoryStore {
    working: BTreeMap<String, MemoryTable>,
    committed: BTreeMap<String, MemoryTable>,
    drops: BTreeMap<String, usize>,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Current rows of a table, including uncommitted writes
    pub fn rows(&self, table: &str) -> Option<&[Vec<SqlValue>]> {
        self.working.get(table).map(|t| t.rows.as_slice())
    }

    pub fn committed_rows(&self, table: &str) -> Option<&[Vec<SqlValue>]> {
        self.committed.get(table).map(|t| t.rows.as_slice())
    }

    pub fn columns(&self, table: &str) -> Option<&[ColumnSpec]> {
        self.working.get(table).map(|t| t.columns.as_slice())
    }

    /// Value of `column` in every row of `table`, in storage order
    pub fn column_values(&self, table: &str, column: &str) -> Option<Vec<SqlValue>> {
        let table = self.working.get(table)?;
        let index = table.columns.iter().position(|c| c.name == column)?;
        Some(table.rows.iter().map(|row| row[index].clone()).collect())
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.working.keys().map(String::as_str).collect()
    }

    /// How many times `table` has been dropped
    pub fn drop_count(&self, table: &str) -> usize {
        self.drops.get(table).copied().unwrap_or(0)
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    fn table_mut(&mut self, table: &str) -> Result<&mut MemoryTable, StoreError> {
        self.working
            .get_mut(table)
            .ok_or_else(|| StoreError::MissingTable(table.to_string()))
    }
}

impl RelationalStore for MemoryStore {
    fn table_columns(&self, table: &str) -> Result<Option<Vec<ExistingColumn>>, StoreError> {
        Ok(self.working.get(table).map(|t| {
            t.columns
                .iter()
                .map(|c| ExistingColumn::new(c.name.clone(), c.column_type.as_sql()))
                .collect()
        }))
    }

    fn create_table(&mut self, table: &str, columns: &[ColumnSpec]) -> Result<(), StoreError> {
        if self.working.contains_key(table) {
            return Err(StoreError::TableExists(table.to_string()));
        }
        self.working.insert(
            table.to_string(),
            MemoryTable {
                columns: columns.to_vec(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> Result<(), StoreError> {
        if self.working.remove(table).is_none() {
            return Err(StoreError::MissingTable(table.to_string()));
        }
        *self.drops.entry(table.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn upsert(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Vec<SqlValue>],
    ) -> Result<usize, StoreError> {
        let target = self.table_mut(table)?;

        let mut indices = Vec::with_capacity(columns.len());
        for column in columns {
            let index = target
                .columns
                .iter()
                .position(|c| &c.name == column)
                .ok_or_else(|| StoreError::UnknownColumn {
                    table: table.to_string(),
                    column: column.clone(),
                })?;
            indices.push(index);
        }

        let primary_key = target.primary_key();
        for row in rows {
            if row.len() != columns.len() {
                return Err(StoreError::ArityMismatch {
                    expected: columns.len(),
                    actual: row.len(),
                });
            }

            let mut stored = vec![SqlValue::Null; target.columns.len()];
            for (value, &index) in row.iter().zip(&indices) {
                stored[index] = value.clone();
            }

            if let Some(pk) = primary_key {
                if stored[pk] != SqlValue::Null {
                    target.rows.retain(|existing| existing[pk] != stored[pk]);
                }
            }
            target.rows.push(stored);
        }

        Ok(rows.len())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.committed = self.working.clone();
        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.working = self.committed.clone();
        Ok(())
    }
}
