//! Per-route weekly counters.
//!
//! Folds the week's stored messages into one counter pair per route.
//! Messages without a route are counted under [`UNKNOWN_ROUTE`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify::IssueDetector;
use crate::store::StoredMessage;

/// Bucket for messages no route could be extracted from.
pub const UNKNOWN_ROUTE: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouteCounters {
    pub total_msgs: u64,
    pub issue_msgs: u64,
}

/// Route name → counters, ordered by route name.
pub type RouteTable = BTreeMap<String, RouteCounters>;

pub fn aggregate(messages: &[StoredMessage], detector: &IssueDetector) -> RouteTable {
    let mut routes = RouteTable::new();
    for msg in messages {
        let route = msg
            .route_name
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(UNKNOWN_ROUTE);
        let counters = routes.entry(route.to_string()).or_default();
        counters.total_msgs += 1;
        if msg.text.as_deref().is_some_and(|t| detector.is_issue(t)) {
            counters.issue_msgs += 1;
        }
    }
    routes
}

/// Sum of all routes' counters.
pub fn totals(routes: &RouteTable) -> RouteCounters {
    routes.values().fold(RouteCounters::default(), |acc, c| RouteCounters {
        total_msgs: acc.total_msgs + c.total_msgs,
        issue_msgs: acc.issue_msgs + c.issue_msgs,
    })
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
