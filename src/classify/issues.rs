/// Keywords counted as a service-issue mention when no list is configured.
pub const DEFAULT_ISSUE_KEYWORDS: &[&str] = &["late", "delay", "breakdown", "issue", "problem"];

/// Flags messages that mention a service problem.
///
/// Matching is a case-insensitive substring scan, so "delayed" and
/// "DELAYS" both count.
#[derive(Debug, Clone)]
pub struct IssueDetector {
    keywords: Vec<String>,
}

impl IssueDetector {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub fn is_issue(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

impl Default for IssueDetector {
    fn default() -> Self {
        Self::new(DEFAULT_ISSUE_KEYWORDS)
    }
}
