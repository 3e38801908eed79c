//! Chat platform collaborator.
//!
//! The pipeline only needs two things from a chat platform: a session it can
//! close, and a newest-first message stream per channel. `ExportChat` reads
//! desktop JSON exports from disk; `RelayChat` pages through an HTTP history
//! relay. Both sit behind the same traits.

mod export;
#[cfg(test)]
pub mod fake;
mod relay;

use chrono::{DateTime, Utc};

use crate::error::Result;

pub use export::ExportChat;
pub use relay::RelayChat;

/// A message as delivered by the platform, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: i64,
    pub date: Option<DateTime<Utc>>,
    pub sender_id: Option<String>,
    pub text: Option<String>,
}

/// Lazy, newest-first, single-pass message stream.
pub type MessageStream<'a> = Box<dyn Iterator<Item = Result<ChatMessage>> + 'a>;

pub trait ChatPlatform {
    fn open_session(&self) -> Result<Box<dyn ChatSession + '_>>;
}

pub trait ChatSession {
    /// Messages of `channel` strictly older than `before`, newest first.
    fn iter_messages(&mut self, channel: &str, before: DateTime<Utc>) -> Result<MessageStream<'_>>;

    fn close(&mut self) -> Result<()>;
}

/// Owns an open session and guarantees it is closed exactly once, on the
/// explicit `close` or, failing that, on drop.
pub struct ScopedSession<'p> {
    session: Box<dyn ChatSession + 'p>,
    closed: bool,
}

impl<'p> ScopedSession<'p> {
    pub fn open(platform: &'p dyn ChatPlatform) -> Result<Self> {
        let session = platform.open_session()?;
        log::debug!("chat session opened");
        Ok(Self {
            session,
            closed: false,
        })
    }

    pub fn session(&mut self) -> &mut (dyn ChatSession + 'p) {
        self.session.as_mut()
    }

    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        let result = self.session.close();
        log::debug!("chat session closed");
        result
    }
}

impl Drop for ScopedSession<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(err) = self.session.close() {
            log::warn!("closing chat session: {err}");
        }
    }
}
