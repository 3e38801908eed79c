use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::{ChatMessage, ChatPlatform, ChatSession, MessageStream};
use crate::error::{Result, SyncError};

const EXPORT_FILE: &str = "result.json";

/// Reads desktop chat exports laid out as `<dir>/<channel>/result.json`.
pub struct ExportChat {
    dir: PathBuf,
}

impl ExportChat {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ChatPlatform for ExportChat {
    fn open_session(&self) -> Result<Box<dyn ChatSession + '_>> {
        if !self.dir.is_dir() {
            return Err(SyncError::Chat(format!(
                "export directory not found: {}",
                self.dir.display()
            )));
        }
        Ok(Box::new(ExportSession { dir: &self.dir }))
    }
}

struct ExportSession<'a> {
    dir: &'a Path,
}

impl ChatSession for ExportSession<'_> {
    fn iter_messages(&mut self, channel: &str, before: DateTime<Utc>) -> Result<MessageStream<'_>> {
        if channel.is_empty() || channel.contains(['/', '\\']) || channel == ".." {
            return Err(SyncError::Chat(format!("invalid channel name: {channel:?}")));
        }
        let path = self.dir.join(channel).join(EXPORT_FILE);
        let content = fs::read_to_string(&path)
            .map_err(|e| SyncError::Chat(format!("{channel}: {}: {e}", path.display())))?;
        let export: ExportFile = serde_json::from_str(&content)
            .map_err(|e| SyncError::Chat(format!("{channel}: {}: {e}", path.display())))?;

        let mut messages: Vec<ChatMessage> = export
            .messages
            .into_iter()
            .map(ExportMessage::into_chat)
            .filter(|m| m.date.is_none_or(|d| d < before))
            .collect();
        // Exports are oldest-first; ids grow with time.
        messages.sort_by(|a, b| b.id.cmp(&a.id));

        Ok(Box::new(messages.into_iter().map(Ok)))
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Deserialize)]
struct ExportFile {
    #[serde(default)]
    messages: Vec<ExportMessage>,
}

#[derive(Deserialize)]
struct ExportMessage {
    id: i64,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    date_unixtime: Option<String>,
    #[serde(default)]
    from_id: Option<String>,
    #[serde(default)]
    text: ExportText,
}

/// `text` is a plain string, or an array mixing strings and entity objects.
#[derive(Deserialize, Default)]
#[serde(untagged)]
enum ExportText {
    Plain(String),
    Rich(Vec<TextPart>),
    #[default]
    Missing,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextPart {
    Plain(String),
    Entity { text: String },
}

impl ExportText {
    fn into_string(self) -> Option<String> {
        match self {
            ExportText::Plain(s) => Some(s),
            ExportText::Rich(parts) => Some(
                parts
                    .into_iter()
                    .map(|p| match p {
                        TextPart::Plain(s) | TextPart::Entity { text: s } => s,
                    })
                    .collect(),
            ),
            ExportText::Missing => None,
        }
    }
}

impl ExportMessage {
    fn into_chat(self) -> ChatMessage {
        let date = self
            .date_unixtime
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                self.date
                    .as_deref()
                    .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok())
                    .map(|n| n.and_utc())
            });
        ChatMessage {
            id: self.id,
            date,
            sender_id: self.from_id,
            text: self.text.into_string(),
        }
    }
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
