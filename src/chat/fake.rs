//! Scriptable in-memory chat platform for tests.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use super::{ChatMessage, ChatPlatform, ChatSession, MessageStream};
use crate::error::{Result, SyncError};

#[derive(Default)]
pub struct FakeChat {
    channels: BTreeMap<String, Vec<ChatMessage>>,
    missing: BTreeSet<String>,
    broken_after: BTreeMap<String, usize>,
    fail_open: bool,
    pub opens: Cell<usize>,
    pub closes: Cell<usize>,
    pub iter_calls: Cell<usize>,
    pub pulled: Cell<usize>,
}

impl FakeChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in any order; they are served newest first.
    pub fn with_channel(mut self, name: &str, mut messages: Vec<ChatMessage>) -> Self {
        messages.sort_by(|a, b| b.date.cmp(&a.date));
        self.channels.insert(name.to_string(), messages);
        self
    }

    pub fn with_missing_channel(mut self, name: &str) -> Self {
        self.missing.insert(name.to_string());
        self
    }

    /// The stream for `name` errors after yielding `n` messages.
    pub fn with_broken_stream(mut self, name: &str, n: usize) -> Self {
        self.broken_after.insert(name.to_string(), n);
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }
}

pub fn message(id: i64, date: DateTime<Utc>, sender: &str, text: &str) -> ChatMessage {
    ChatMessage {
        id,
        date: Some(date),
        sender_id: Some(sender.to_string()),
        text: Some(text.to_string()),
    }
}

impl ChatPlatform for FakeChat {
    fn open_session(&self) -> Result<Box<dyn ChatSession + '_>> {
        self.opens.set(self.opens.get() + 1);
        if self.fail_open {
            return Err(SyncError::Chat("auth failed".to_string()));
        }
        Ok(Box::new(FakeSession { chat: self }))
    }
}

struct FakeSession<'a> {
    chat: &'a FakeChat,
}

impl ChatSession for FakeSession<'_> {
    fn iter_messages(&mut self, channel: &str, before: DateTime<Utc>) -> Result<MessageStream<'_>> {
        let chat = self.chat;
        chat.iter_calls.set(chat.iter_calls.get() + 1);
        if chat.missing.contains(channel) {
            return Err(SyncError::Chat(format!("{channel}: channel not found")));
        }
        let messages: Vec<ChatMessage> = chat
            .channels
            .get(channel)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|m| m.date.is_none_or(|d| d < before))
            .collect();
        let break_at = chat.broken_after.get(channel).copied();
        let channel = channel.to_string();

        let mut items: Vec<Result<ChatMessage>> = messages.into_iter().map(Ok).collect();
        if let Some(n) = break_at {
            items.truncate(n);
            items.push(Err(SyncError::Chat(format!("{channel}: connection reset"))));
        }
        Ok(Box::new(items.into_iter().inspect(move |_| {
            chat.pulled.set(chat.pulled.get() + 1);
        })))
    }

    fn close(&mut self) -> Result<()> {
        self.chat.closes.set(self.chat.closes.get() + 1);
        Ok(())
    }
}
