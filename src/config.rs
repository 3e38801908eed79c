//! Run configuration: a TOML file for the shape of the job, environment
//! variables for secrets.
//!
//! ```toml
//! channels = ["group_username_1", "group_username_2"]
//! snapshot_path = "dashboard/data.json"
//!
//! [store]
//! url = "https://project.supabase.co"
//!
//! [chat]
//! kind = "export"
//! export_dir = "exports"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::chat::{ChatPlatform, ExportChat, RelayChat};
use crate::classify::route::DEFAULT_BUS_PATTERN;
use crate::classify::{AliasClassifier, IssueDetector, RouteAlias, RouteClassifier, StubClassifier};
use crate::classify::issues::DEFAULT_ISSUE_KEYWORDS;
use crate::error::{Result, SyncError};
use crate::store::{DataStore, PostgrestStore};

pub const DEFAULT_CONFIG_FILE: &str = "tpulse.toml";
const DEFAULT_SNAPSHOT_PATH: &str = "dashboard/data.json";
const DEFAULT_STORE_URL_ENV: &str = "SUPABASE_URL";
const DEFAULT_STORE_KEY_ENV: &str = "SUPABASE_KEY";
const DEFAULT_CHAT_TOKEN_ENV: &str = "TPULSE_CHAT_TOKEN";
const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub channels: Vec<String>,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    #[serde(default = "default_issue_keywords")]
    pub issue_keywords: Vec<String>,
    #[serde(default)]
    pub store: StoreConfig,
    pub chat: ChatConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_store_key_env")]
    pub key_env: String,
    #[serde(skip)]
    pub key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            key_env: default_store_key_env(),
            key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatConfig {
    /// Desktop JSON exports under `<export_dir>/<channel>/result.json`.
    Export { export_dir: PathBuf },
    /// HTTP history relay.
    Relay {
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default = "default_chat_token_env")]
        token_env: String,
        #[serde(default = "default_page_size")]
        page_size: usize,
        #[serde(skip)]
        token: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    Stub,
    Alias,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub kind: ClassifierKind,
    #[serde(default)]
    pub bus_pattern: Option<String>,
    #[serde(default)]
    pub routes: Vec<RouteAlias>,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from(DEFAULT_SNAPSHOT_PATH)
}

fn default_issue_keywords() -> Vec<String> {
    DEFAULT_ISSUE_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_store_key_env() -> String {
    DEFAULT_STORE_KEY_ENV.to_string()
}

fn default_chat_token_env() -> String {
    DEFAULT_CHAT_TOKEN_ENV.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Fill secrets and URL overrides from the environment.
    pub fn with_env(mut self, env: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = env(DEFAULT_STORE_URL_ENV).filter(|u| !u.is_empty()) {
            self.store.url = Some(url);
        }
        self.store.key = env(&self.store.key_env).filter(|k| !k.is_empty());
        if let ChatConfig::Relay {
            token_env, token, ..
        } = &mut self.chat
        {
            *token = env(token_env).filter(|t| !t.is_empty());
        }
        self
    }

    /// Check the configuration before any work starts. Duplicate channels
    /// are dropped, keeping the first occurrence.
    pub fn validate(&mut self, needs_store: bool) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        let mut channels = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let channel = channel.trim();
            if channel.is_empty() {
                return Err(SyncError::Config("empty channel name".to_string()));
            }
            if seen.insert(channel.to_string()) {
                channels.push(channel.to_string());
            } else {
                log::warn!("duplicate channel {channel:?} ignored");
            }
        }
        if channels.is_empty() {
            return Err(SyncError::Config("no channels configured".to_string()));
        }
        self.channels = channels;

        if needs_store {
            self.store_credentials()?;
        }

        match &self.chat {
            ChatConfig::Export { export_dir } if export_dir.as_os_str().is_empty() => {
                return Err(SyncError::Config("chat.export_dir is empty".to_string()));
            }
            ChatConfig::Relay { base_url: None, .. } => {
                return Err(SyncError::Config("chat.base_url is required for relay".to_string()));
            }
            ChatConfig::Relay {
                token: None,
                token_env,
                ..
            } => {
                return Err(SyncError::Config(format!(
                    "chat relay token missing (set {token_env})"
                )));
            }
            _ => {}
        }

        if self.snapshot_path.as_os_str().is_empty() {
            return Err(SyncError::Config("snapshot_path is empty".to_string()));
        }

        // Surface bad patterns and URLs now rather than mid-run.
        self.route_classifier()?;
        self.chat_platform()?;
        Ok(())
    }

    fn store_credentials(&self) -> Result<(&str, &str)> {
        let url = self.store.url.as_deref().ok_or_else(|| {
            SyncError::Config(format!(
                "store url missing (set store.url or {DEFAULT_STORE_URL_ENV})"
            ))
        })?;
        let key = self.store.key.as_deref().ok_or_else(|| {
            SyncError::Config(format!("store key missing (set {})", self.store.key_env))
        })?;
        Ok((url, key))
    }

    pub fn issue_detector(&self) -> IssueDetector {
        IssueDetector::new(&self.issue_keywords)
    }

    pub fn route_classifier(&self) -> Result<Box<dyn RouteClassifier>> {
        match self.classifier.kind {
            ClassifierKind::Stub => Ok(Box::new(StubClassifier)),
            ClassifierKind::Alias => {
                let bus = self
                    .classifier
                    .bus_pattern
                    .as_deref()
                    .unwrap_or(DEFAULT_BUS_PATTERN);
                Ok(Box::new(AliasClassifier::new(&self.classifier.routes, Some(bus))?))
            }
        }
    }

    pub fn chat_platform(&self) -> Result<Box<dyn ChatPlatform>> {
        match &self.chat {
            ChatConfig::Export { export_dir } => Ok(Box::new(ExportChat::new(export_dir.clone()))),
            ChatConfig::Relay {
                base_url,
                token,
                page_size,
                ..
            } => {
                let (Some(base_url), Some(token)) = (base_url, token) else {
                    return Err(SyncError::Config("chat relay is not configured".to_string()));
                };
                Ok(Box::new(RelayChat::new(base_url, token.clone(), *page_size)?))
            }
        }
    }

    pub fn data_store(&self) -> Result<Box<dyn DataStore>> {
        let (url, key) = self.store_credentials()?;
        Ok(Box::new(PostgrestStore::new(url, key)?))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
