use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A chat channel whose stream could not be read to the end of the window.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChannelFailure {
    pub channel: String,
    pub error: String,
}

impl fmt::Display for ChannelFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.channel, self.error)
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("chat platform error: {0}")]
    Chat(String),

    #[error("ingestion failed for {} channel(s): {}", .0.len(), join_failures(.0))]
    Ingestion(Vec<ChannelFailure>),

    #[error("data store error: {0}")]
    Store(String),

    #[error("snapshot error: {source} (path: {path})")]
    Snapshot {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;

fn join_failures(failures: &[ChannelFailure]) -> String {
    failures
        .iter()
        .map(ChannelFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
