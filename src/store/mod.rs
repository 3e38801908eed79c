//! Remote data store collaborator.
//!
//! `DataStore` is the narrow, untyped surface (select rows by equality
//! filters, upsert rows by each table's conflict key). `Persister` layers the
//! typed operations the pipeline uses on top of it.

mod memory;
mod persister;
mod postgrest;

use serde_json::Value;

use crate::error::Result;

pub use memory::MemoryStore;
pub use persister::{Persister, RawMessage, StoredMessage};
pub use postgrest::PostgrestStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    MessagesRaw,
    WeeklyAggregate,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::MessagesRaw => "messages_raw",
            Table::WeeklyAggregate => "weekly_aggregate",
        }
    }

    /// Columns that identify a row for upsert purposes.
    pub fn conflict_columns(self) -> &'static [&'static str] {
        match self {
            Table::MessagesRaw => &["msg_id", "group_name", "week_key"],
            Table::WeeklyAggregate => &["week_key", "route_name"],
        }
    }
}

/// Equality filter on one column.
#[derive(Debug, Clone, Copy)]
pub struct Filter<'a> {
    pub column: &'a str,
    pub value: &'a str,
}

pub fn eq<'a>(column: &'a str, value: &'a str) -> Filter<'a> {
    Filter { column, value }
}

pub trait DataStore {
    /// Rows of `table` matching every filter. `columns` is a comma-separated
    /// projection, `"*"` for all.
    fn select(&self, table: Table, columns: &str, filters: &[Filter<'_>]) -> Result<Vec<Value>>;

    /// Insert or overwrite rows keyed by `table.conflict_columns()`.
    fn upsert(&self, table: Table, rows: &[Value]) -> Result<()>;
}
