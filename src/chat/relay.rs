use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;

use super::{ChatMessage, ChatPlatform, ChatSession, MessageStream};
use crate::error::{Result, SyncError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP history relay in front of the chat platform.
///
/// `GET {base}/channels/{channel}/messages?before=..&limit=..[&cursor=..]`
/// returns one newest-first page plus an optional `next_cursor`.
pub struct RelayChat {
    base_url: Url,
    token: String,
    page_size: usize,
}

impl RelayChat {
    pub fn new(base_url: &str, token: impl Into<String>, page_size: usize) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SyncError::Config(format!("invalid chat relay url {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::Config(format!(
                "chat relay url cannot be a base: {base_url}"
            )));
        }
        Ok(Self {
            base_url,
            token: token.into(),
            page_size: page_size.max(1),
        })
    }

    fn messages_url(&self, channel: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["channels", channel, "messages"]);
        }
        url
    }
}

impl ChatPlatform for RelayChat {
    fn open_session(&self) -> Result<Box<dyn ChatSession + '_>> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Chat(format!("building HTTP client: {e}")))?;
        Ok(Box::new(RelaySession {
            relay: self,
            client,
        }))
    }
}

struct RelaySession<'a> {
    relay: &'a RelayChat,
    client: Client,
}

impl ChatSession for RelaySession<'_> {
    fn iter_messages(&mut self, channel: &str, before: DateTime<Utc>) -> Result<MessageStream<'_>> {
        let client = &self.client;
        let token = self.relay.token.as_str();
        let url = self.relay.messages_url(channel);
        let before = before.to_rfc3339_opts(SecondsFormat::Millis, true);
        let limit = self.relay.page_size.to_string();
        let label = channel.to_string();

        let fetch = move |cursor: Option<&str>| -> Result<RelayPage> {
            let mut query = vec![("before", before.as_str()), ("limit", limit.as_str())];
            if let Some(cursor) = cursor {
                query.push(("cursor", cursor));
            }
            let resp = client
                .get(url.clone())
                .bearer_auth(token)
                .query(&query)
                .send()
                .map_err(|e| SyncError::Chat(format!("{label}: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().unwrap_or_default();
                return Err(SyncError::Chat(format!(
                    "{label}: relay error ({status}): {body}"
                )));
            }
            resp.json()
                .map_err(|e| SyncError::Chat(format!("{label}: bad relay page: {e}")))
        };

        Ok(Box::new(RelayStream::new(channel, fetch)))
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

type PageFetch<'a> = Box<dyn FnMut(Option<&str>) -> Result<RelayPage> + 'a>;

/// Fetches pages on demand; nothing is requested past the point where the
/// consumer stops iterating. An empty page or a missing `next_cursor` ends
/// the stream.
struct RelayStream<'a> {
    channel: String,
    fetch: PageFetch<'a>,
    buffer: VecDeque<ChatMessage>,
    cursor: Option<String>,
    done: bool,
}

impl<'a> RelayStream<'a> {
    fn new(channel: &str, fetch: impl FnMut(Option<&str>) -> Result<RelayPage> + 'a) -> Self {
        Self {
            channel: channel.to_string(),
            fetch: Box::new(fetch),
            buffer: VecDeque::new(),
            cursor: None,
            done: false,
        }
    }

    fn fetch_page(&mut self) -> Result<()> {
        let page = (self.fetch)(self.cursor.as_deref())?;
        log::debug!("{}: fetched {} message(s)", self.channel, page.messages.len());

        if page.messages.is_empty() || page.next_cursor.is_none() {
            self.done = true;
        }
        self.cursor = page.next_cursor;
        self.buffer
            .extend(page.messages.into_iter().map(RelayMessage::into_chat));
        Ok(())
    }
}

impl Iterator for RelayStream<'_> {
    type Item = Result<ChatMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            if let Err(err) = self.fetch_page() {
                self.done = true;
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

#[derive(Deserialize)]
struct RelayPage {
    #[serde(default)]
    messages: Vec<RelayMessage>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct RelayMessage {
    id: i64,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
    #[serde(default)]
    sender_id: Option<IdLike>,
    #[serde(default)]
    text: Option<String>,
}

/// Sender ids arrive as numbers from some platforms and strings from others.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdLike {
    Number(i64),
    Text(String),
}

impl RelayMessage {
    fn into_chat(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            date: self.date,
            sender_id: self.sender_id.map(|s| match s {
                IdLike::Number(n) => n.to_string(),
                IdLike::Text(t) => t,
            }),
            text: self.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn messages_url_appends_encoded_channel() {
        let relay = RelayChat::new("https://relay.example.com/api/", "t", 50).unwrap();
        assert_eq!(
            relay.messages_url("riders 12").as_str(),
            "https://relay.example.com/api/channels/riders%2012/messages"
        );
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(RelayChat::new("not a url", "t", 50).is_err());
        assert!(RelayChat::new("mailto:ops@example.com", "t", 50).is_err());
    }

    #[test]
    fn page_parses_numeric_and_string_senders() {
        let page: RelayPage = serde_json::from_str(
            r#"{"messages": [
                {"id": 2, "date": "2024-01-09T08:15:00Z", "sender_id": 42, "text": "late"},
                {"id": 1, "sender_id": "user7"}
            ], "next_cursor": "abc"}"#,
        )
        .unwrap();
        let msgs: Vec<ChatMessage> = page.messages.into_iter().map(RelayMessage::into_chat).collect();
        assert_eq!(msgs[0].sender_id.as_deref(), Some("42"));
        assert!(msgs[0].date.is_some());
        assert_eq!(msgs[1].sender_id.as_deref(), Some("user7"));
        assert_eq!(msgs[1].text, None);
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));
    }

    fn page(ids: &[i64], next_cursor: Option<&str>) -> RelayPage {
        RelayPage {
            messages: ids
                .iter()
                .map(|&id| RelayMessage {
                    id,
                    date: None,
                    sender_id: None,
                    text: Some(format!("msg {id}")),
                })
                .collect(),
            next_cursor: next_cursor.map(str::to_string),
        }
    }

    /// Serves `pages` in order and records the cursor of every request.
    fn canned(
        pages: Vec<RelayPage>,
        seen: &RefCell<Vec<Option<String>>>,
    ) -> impl FnMut(Option<&str>) -> Result<RelayPage> + '_ {
        let mut pages = pages.into_iter();
        move |cursor: Option<&str>| {
            seen.borrow_mut().push(cursor.map(str::to_string));
            pages
                .next()
                .ok_or_else(|| SyncError::Chat("fetched past the last page".to_string()))
        }
    }

    fn ids(stream: RelayStream<'_>) -> Vec<i64> {
        stream.map(|m| m.unwrap().id).collect()
    }

    #[test]
    fn follows_cursor_until_it_is_missing() {
        let seen = RefCell::new(Vec::new());
        let pages = vec![page(&[5, 4], Some("c1")), page(&[3, 2], Some("c2")), page(&[1], None)];
        let stream = RelayStream::new("riders", canned(pages, &seen));
        assert_eq!(ids(stream), vec![5, 4, 3, 2, 1]);
        assert_eq!(
            *seen.borrow(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[test]
    fn stops_on_empty_page_even_with_cursor() {
        let seen = RefCell::new(Vec::new());
        let pages = vec![page(&[2, 1], Some("c1")), page(&[], Some("c2"))];
        let stream = RelayStream::new("riders", canned(pages, &seen));
        assert_eq!(ids(stream), vec![2, 1]);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn pages_are_fetched_lazily() {
        let seen = RefCell::new(Vec::new());
        let pages = vec![page(&[4, 3], Some("c1")), page(&[2, 1], None)];
        let mut stream = RelayStream::new("riders", canned(pages, &seen));
        assert_eq!(stream.next().unwrap().unwrap().id, 4);
        assert_eq!(stream.next().unwrap().unwrap().id, 3);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn fetch_error_is_yielded_once_then_ends() {
        let mut calls = 0;
        let mut stream = RelayStream::new("riders", |_| {
            calls += 1;
            Err(SyncError::Chat("relay error (502)".to_string()))
        });
        assert!(matches!(stream.next(), Some(Err(SyncError::Chat(_)))));
        assert!(stream.next().is_none());
        drop(stream);
        assert_eq!(calls, 1);
    }
}
