use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, SyncError};

/// Route and bus number pulled out of a message. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: Option<String>,
    pub bus: Option<String>,
}

/// Maps free text to a route/bus pair.
///
/// Implementations must be total: any input, including empty or
/// non-linguistic text, yields a `RouteMatch` (possibly empty), never a panic.
pub trait RouteClassifier {
    fn classify(&self, text: &str) -> RouteMatch;
}

/// Extracts nothing. Every message lands in the "Unknown" bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubClassifier;

impl RouteClassifier for StubClassifier {
    fn classify(&self, _text: &str) -> RouteMatch {
        RouteMatch::default()
    }
}

/// One route and the phrases riders use for it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RouteAlias {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Bus numbers like "bus 4521", "Bus no. 77", "bus #310".
pub const DEFAULT_BUS_PATTERN: &str = r"(?i)\bbus\s*(?:no\.?|#)?\s*(\d{1,5})\b";

/// Alias-table classifier: the first route (in configuration order) with a
/// matching alias wins. Aliases match case-insensitively on word boundaries.
#[derive(Debug, Clone)]
pub struct AliasClassifier {
    routes: Vec<(String, Regex)>,
    bus: Option<Regex>,
}

impl AliasClassifier {
    pub fn new(routes: &[RouteAlias], bus_pattern: Option<&str>) -> Result<Self> {
        let mut compiled = Vec::with_capacity(routes.len());
        for route in routes {
            if route.name.trim().is_empty() {
                return Err(SyncError::Config("route with empty name".to_string()));
            }
            let mut alternatives: Vec<String> = route
                .aliases
                .iter()
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
                .map(bounded)
                .collect();
            // The route name itself is always an alias.
            alternatives.push(bounded(route.name.trim()));
            let pattern = format!("(?i)(?:{})", alternatives.join("|"));
            let re = Regex::new(&pattern).map_err(|e| {
                SyncError::Config(format!("route {:?}: invalid alias pattern: {e}", route.name))
            })?;
            compiled.push((route.name.clone(), re));
        }

        let bus = bus_pattern
            .map(|p| {
                let re = Regex::new(p)
                    .map_err(|e| SyncError::Config(format!("invalid bus_pattern: {e}")))?;
                if re.captures_len() < 2 {
                    return Err(SyncError::Config(
                        "bus_pattern needs a capture group for the bus number".to_string(),
                    ));
                }
                Ok(re)
            })
            .transpose()?;

        Ok(Self {
            routes: compiled,
            bus,
        })
    }
}

/// Escape an alias and anchor it on word boundaries where its edges are word
/// characters. `\b` next to punctuation would never match.
fn bounded(alias: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut out = String::new();
    if alias.chars().next().is_some_and(is_word) {
        out.push_str(r"\b");
    }
    out.push_str(&regex::escape(alias));
    if alias.chars().next_back().is_some_and(is_word) {
        out.push_str(r"\b");
    }
    out
}

impl RouteClassifier for AliasClassifier {
    fn classify(&self, text: &str) -> RouteMatch {
        let route = self
            .routes
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(name, _)| name.clone());
        let bus = self
            .bus
            .as_ref()
            .and_then(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        RouteMatch { route, bus }
    }
}

#[cfg(test)]
#[path = "route_test.rs"]
mod tests;
