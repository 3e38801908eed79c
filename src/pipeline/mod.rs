//! The weekly sync, end to end.
//!
//! guard → ingest → save raw → re-read week → aggregate → save aggregates →
//! snapshot. Aggregation works from what is durably stored rather than the
//! in-memory batch, so rows left by an earlier partial run are included.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{RouteTable, aggregate};
use crate::chat::ChatPlatform;
use crate::classify::{IssueDetector, RouteClassifier};
use crate::error::{ChannelFailure, Result, SyncError};
use crate::guard::{self, GuardDecision};
use crate::ingest;
use crate::snapshot::{DashboardSnapshot, write_snapshot};
use crate::store::{DataStore, Persister};
use crate::window::{TimeWindow, last_completed_week};

/// External systems one run talks to.
pub struct Collaborators<'a> {
    pub chat: &'a dyn ChatPlatform,
    pub store: &'a dyn DataStore,
    pub classifier: &'a dyn RouteClassifier,
}

pub struct SyncOptions<'a> {
    pub channels: &'a [String],
    pub detector: &'a IssueDetector,
    /// `None` skips writing the snapshot file.
    pub snapshot_path: Option<&'a Path>,
    /// Rebuild the week even if aggregates already exist.
    pub force: bool,
    /// Aggregate and publish even when some channels failed.
    pub allow_partial: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    AlreadySynced { window: TimeWindow },
    Completed(SyncSummary),
}

#[derive(Debug, Serialize)]
pub struct SyncSummary {
    pub window: TimeWindow,
    pub ingested: usize,
    pub per_channel: Vec<(String, usize)>,
    pub failures: Vec<ChannelFailure>,
    pub routes: RouteTable,
    pub snapshot: Option<PathBuf>,
}

pub fn run(now: DateTime<Utc>, collab: &Collaborators<'_>, opts: &SyncOptions<'_>) -> Result<SyncOutcome> {
    let window = last_completed_week(now);
    log::info!(
        "target week {} ({} .. {})",
        window.week_key,
        window.start,
        window.end
    );

    let persister = Persister::new(collab.store);
    if guard::check(&persister, &window.week_key, opts.force)? == GuardDecision::AlreadySynced {
        log::info!("{} already synced, nothing to do", window.week_key);
        return Ok(SyncOutcome::AlreadySynced { window });
    }

    let batch = ingest::ingest(collab.chat, opts.channels, &window, collab.classifier)?;
    persister.save_raw(&batch.rows)?;

    if !batch.failures.is_empty() {
        if !opts.allow_partial {
            // Raw rows of healthy channels are kept; no aggregate is written so
            // the guard lets the next run retry the whole week.
            return Err(SyncError::Ingestion(batch.failures));
        }
        log::warn!(
            "{} channel(s) failed, publishing partial week",
            batch.failures.len()
        );
    }

    let stored = persister.load_week_messages(&window.week_key)?;
    let routes = aggregate(&stored, opts.detector);
    for (route, counters) in &routes {
        persister.save_aggregate(&window.week_key, route, counters)?;
    }
    log::info!(
        "{}: {} route(s) from {} stored message(s)",
        window.week_key,
        routes.len(),
        stored.len()
    );

    let snapshot = match opts.snapshot_path {
        Some(path) => {
            let snap = DashboardSnapshot::build(&window.week_key, now, &routes);
            write_snapshot(path, &snap)?;
            Some(path.to_path_buf())
        }
        None => None,
    };

    Ok(SyncOutcome::Completed(SyncSummary {
        ingested: batch.rows.len(),
        per_channel: batch.per_channel,
        failures: batch.failures,
        routes,
        snapshot,
        window,
    }))
}

/// Rebuild the snapshot for `week_key` from stored aggregates alone.
pub fn rebuild_snapshot(
    now: DateTime<Utc>,
    store: &dyn DataStore,
    week_key: &str,
    path: &Path,
) -> Result<DashboardSnapshot> {
    let rows = Persister::new(store).load_aggregates(week_key)?;
    if rows.is_empty() {
        return Err(SyncError::Store(format!(
            "no weekly_aggregate rows for {week_key}"
        )));
    }
    let routes: RouteTable = rows
        .iter()
        .map(|r| (r.route_name.clone(), r.counters()))
        .collect();
    let snap = DashboardSnapshot::build(week_key, now, &routes);
    write_snapshot(path, &snap)?;
    Ok(snap)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
