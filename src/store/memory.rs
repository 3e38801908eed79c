use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::{DataStore, Filter, Table};
use crate::error::{Result, SyncError};

/// In-process store with the same keyed-upsert semantics as the remote one.
/// Backs `--dry-run` and the pipeline tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RefCell<BTreeMap<Table, Vec<Value>>>,
    selects: Cell<usize>,
    upserts: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables.borrow().get(&table).cloned().unwrap_or_default()
    }

    #[cfg(test)]
    pub fn select_calls(&self) -> usize {
        self.selects.get()
    }

    #[cfg(test)]
    pub fn upsert_calls(&self) -> usize {
        self.upserts.get()
    }
}

/// Render a scalar cell the way it would appear in a query string.
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn project(row: &Value, columns: &str) -> Value {
    if columns.trim() == "*" {
        return row.clone();
    }
    let picked: Map<String, Value> = columns
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| (c.to_string(), row.get(c).cloned().unwrap_or(Value::Null)))
        .collect();
    Value::Object(picked)
}

fn conflict_key(table: Table, row: &Value) -> Result<Vec<Value>> {
    table
        .conflict_columns()
        .iter()
        .map(|col| match row.get(*col) {
            Some(v) if !v.is_null() => Ok(v.clone()),
            _ => Err(SyncError::Store(format!(
                "{}: row is missing key column {col}",
                table.name()
            ))),
        })
        .collect()
}

impl DataStore for MemoryStore {
    fn select(&self, table: Table, columns: &str, filters: &[Filter<'_>]) -> Result<Vec<Value>> {
        self.selects.set(self.selects.get() + 1);
        let tables = self.tables.borrow();
        let rows = tables.get(&table).map(Vec::as_slice).unwrap_or_default();
        Ok(rows
            .iter()
            .filter(|row| {
                filters.iter().all(|f| {
                    row.get(f.column).and_then(cell_text).as_deref() == Some(f.value)
                })
            })
            .map(|row| project(row, columns))
            .collect())
    }

    fn upsert(&self, table: Table, rows: &[Value]) -> Result<()> {
        self.upserts.set(self.upserts.get() + 1);
        let keyed = rows
            .iter()
            .map(|row| Ok((conflict_key(table, row)?, row.clone())))
            .collect::<Result<Vec<_>>>()?;

        let mut tables = self.tables.borrow_mut();
        let stored = tables.entry(table).or_default();
        for (key, row) in keyed {
            let existing = stored
                .iter()
                .position(|r| conflict_key(table, r).is_ok_and(|k| k == key));
            match existing {
                Some(idx) => stored[idx] = row,
                None => stored.push(row),
            }
        }
        Ok(())
    }
}
