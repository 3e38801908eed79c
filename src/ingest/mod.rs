//! Message ingestion for one weekly window.
//!
//! Opens a single chat session for the phase, walks each channel's
//! newest-first stream from the window end, and stops at the first message
//! older than the window start. Each kept message is hashed and classified
//! as it is read. A channel that fails is recorded and skipped; the others
//! still run.

use chrono::TimeDelta;

use crate::chat::{ChatPlatform, ChatSession, ScopedSession};
use crate::classify::RouteClassifier;
use crate::error::{ChannelFailure, Result};
use crate::privacy::hash_optional_sender;
use crate::store::RawMessage;
use crate::window::TimeWindow;

/// Everything read in one ingestion phase.
#[derive(Debug, Default)]
pub struct IngestBatch {
    pub rows: Vec<RawMessage>,
    pub failures: Vec<ChannelFailure>,
    /// Rows per successfully read channel, in configuration order.
    pub per_channel: Vec<(String, usize)>,
}

pub fn ingest(
    platform: &dyn ChatPlatform,
    channels: &[String],
    window: &TimeWindow,
    classifier: &dyn RouteClassifier,
) -> Result<IngestBatch> {
    let mut scoped = ScopedSession::open(platform)?;
    let mut batch = IngestBatch::default();

    for channel in channels {
        match ingest_channel(scoped.session(), channel, window, classifier) {
            Ok(rows) => {
                log::info!("{channel}: {} message(s) in {}", rows.len(), window.week_key);
                batch.per_channel.push((channel.clone(), rows.len()));
                batch.rows.extend(rows);
            }
            Err(err) => {
                log::warn!("{channel}: skipped: {err}");
                batch.failures.push(ChannelFailure {
                    channel: channel.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    if let Err(err) = scoped.close() {
        log::warn!("closing chat session: {err}");
    }
    Ok(batch)
}

fn ingest_channel(
    session: &mut (dyn ChatSession + '_),
    channel: &str,
    window: &TimeWindow,
    classifier: &dyn RouteClassifier,
) -> Result<Vec<RawMessage>> {
    let mut rows = Vec::new();
    // The platform bound is exclusive; the window end is inclusive.
    let before = window.end + TimeDelta::milliseconds(1);
    for item in session.iter_messages(channel, before)? {
        let msg = item?;
        let Some(date) = msg.date else {
            log::debug!("{channel}: message {} has no date, dropped", msg.id);
            continue;
        };
        if date < window.start {
            break;
        }
        if !window.contains(date) {
            continue;
        }
        let Some(text) = msg.text.filter(|t| !t.is_empty()) else {
            log::debug!("{channel}: message {} has no text, dropped", msg.id);
            continue;
        };

        let route = classifier.classify(&text);
        rows.push(RawMessage {
            msg_id: msg.id,
            group_name: channel.to_string(),
            date,
            user_hash: hash_optional_sender(msg.sender_id.as_deref()),
            text,
            route_name: route.route,
            bus_no: route.bus,
            week_key: window.week_key.clone(),
        });
    }
    Ok(rows)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
