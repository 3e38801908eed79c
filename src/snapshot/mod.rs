//! Dashboard snapshot: a JSON projection of one week's aggregates.
//!
//! The file is always replaced whole. It is written to a temp file in the
//! target directory and renamed over the old one, so readers see either the
//! previous snapshot or the new one, never a partial write.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::aggregate::{RouteTable, totals};
use crate::error::{Result, SyncError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub week: String,
    pub last_sync: String,
    pub total_messages: u64,
    pub total_issues: u64,
    pub topics: BTreeMap<String, u64>,
    pub routes: Vec<RouteEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub route: String,
    pub total_msgs: u64,
    pub issue_msgs: u64,
    pub top_buses: Vec<String>,
    pub topics: BTreeMap<String, u64>,
}

impl DashboardSnapshot {
    pub fn build(week_key: &str, synced_at: DateTime<Utc>, routes: &RouteTable) -> Self {
        let sum = totals(routes);
        Self {
            week: week_key.to_string(),
            last_sync: synced_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_messages: sum.total_msgs,
            total_issues: sum.issue_msgs,
            topics: BTreeMap::new(),
            routes: routes
                .iter()
                .map(|(route, c)| RouteEntry {
                    route: route.clone(),
                    total_msgs: c.total_msgs,
                    issue_msgs: c.issue_msgs,
                    top_buses: Vec::new(),
                    topics: BTreeMap::new(),
                })
                .collect(),
        }
    }
}

/// Atomically replace `path` with the pretty-printed snapshot.
pub fn write_snapshot(path: &Path, snapshot: &DashboardSnapshot) -> Result<()> {
    let wrap = |source: std::io::Error| SyncError::Snapshot {
        source,
        path: path.to_path_buf(),
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(wrap)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(wrap)?;
    serde_json::to_writer_pretty(&mut tmp, snapshot)?;
    tmp.write_all(b"\n").map_err(wrap)?;
    tmp.as_file().sync_all().map_err(wrap)?;
    tmp.persist(path).map_err(|e| wrap(e.error))?;

    log::info!("snapshot for {} written to {}", snapshot.week, path.display());
    Ok(())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
