use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{DataStore, Table, eq};
use crate::aggregate::RouteCounters;
use crate::error::{Result, SyncError};

/// One ingested chat message, as stored in `messages_raw`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub msg_id: i64,
    pub group_name: String,
    pub date: DateTime<Utc>,
    pub user_hash: String,
    pub text: String,
    pub route_name: Option<String>,
    pub bus_no: Option<String>,
    pub week_key: String,
}

/// The slice of a `messages_raw` row the aggregator reads back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoredMessage {
    #[serde(default)]
    pub route_name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// One `(week_key, route_name)` row of `weekly_aggregate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAggregate {
    pub week_key: String,
    pub route_name: String,
    pub total_msgs: u64,
    pub issue_msgs: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub top_buses: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic_breakup: BTreeMap<String, u64>,
}

impl WeeklyAggregate {
    pub fn counters(&self) -> RouteCounters {
        RouteCounters {
            total_msgs: self.total_msgs,
            issue_msgs: self.issue_msgs,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Typed reads and idempotent writes over a `DataStore`.
pub struct Persister<'s> {
    store: &'s dyn DataStore,
}

impl<'s> Persister<'s> {
    pub fn new(store: &'s dyn DataStore) -> Self {
        Self { store }
    }

    /// Whether any aggregate row exists for the week.
    pub fn has_aggregate(&self, week_key: &str) -> Result<bool> {
        let rows = self.store.select(
            Table::WeeklyAggregate,
            "week_key",
            &[eq("week_key", week_key)],
        )?;
        Ok(!rows.is_empty())
    }

    pub fn save_raw(&self, rows: &[RawMessage]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let values = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.store.upsert(Table::MessagesRaw, &values)?;
        log::info!("saved {} raw message(s)", rows.len());
        Ok(())
    }

    pub fn load_week_messages(&self, week_key: &str) -> Result<Vec<StoredMessage>> {
        let rows = self.store.select(
            Table::MessagesRaw,
            "route_name,text",
            &[eq("week_key", week_key)],
        )?;
        decode_rows(Table::MessagesRaw, rows)
    }

    /// Overwrite the aggregate row for one route. Reserved fields are written
    /// empty.
    pub fn save_aggregate(
        &self,
        week_key: &str,
        route_name: &str,
        counters: &RouteCounters,
    ) -> Result<()> {
        let row = WeeklyAggregate {
            week_key: week_key.to_string(),
            route_name: route_name.to_string(),
            total_msgs: counters.total_msgs,
            issue_msgs: counters.issue_msgs,
            top_buses: Vec::new(),
            topic_breakup: BTreeMap::new(),
        };
        self.store
            .upsert(Table::WeeklyAggregate, &[serde_json::to_value(&row)?])
    }

    /// All aggregate rows for the week, ordered by route name.
    pub fn load_aggregates(&self, week_key: &str) -> Result<Vec<WeeklyAggregate>> {
        let rows = self.store.select(
            Table::WeeklyAggregate,
            "*",
            &[eq("week_key", week_key)],
        )?;
        let mut aggregates: Vec<WeeklyAggregate> = decode_rows(Table::WeeklyAggregate, rows)?;
        aggregates.sort_by(|a, b| a.route_name.cmp(&b.route_name));
        Ok(aggregates)
    }
}

fn decode_rows<T: DeserializeOwned>(table: Table, rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| {
                SyncError::Store(format!("unexpected {} row: {e}", table.name()))
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "persister_test.rs"]
mod tests;
