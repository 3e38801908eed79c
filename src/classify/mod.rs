//! Message classification: route/bus extraction and issue detection.
//!
//! Both halves are total functions over arbitrary text. Route extraction is
//! a strategy so a smarter extractor can be swapped in without touching the
//! pipeline; issue detection is a plain keyword scan.

pub mod issues;
pub mod route;

pub use issues::IssueDetector;
pub use route::{AliasClassifier, RouteAlias, RouteClassifier, RouteMatch, StubClassifier};
