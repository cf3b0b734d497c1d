// ABOUTME: Error types for the extraction pipeline including the ErrorCode enum and ExtractError struct.
// ABOUTME: Provides categorized errors, convenience constructors, predicates and user-facing fallback messages.

use std::fmt;
use std::time::Duration;

/// Error codes representing the categories of extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Timeout,
    Network,
    Parse,
    SectionNotFound,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Network => "network error",
            ErrorCode::Parse => "parse error",
            ErrorCode::SectionNotFound => "section not found",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for extraction operations.
#[derive(Debug, thiserror::Error)]
pub struct ExtractError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cfread: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ExtractError {
    fn new(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Timeout, url, op, source)
    }

    /// Create a Network error.
    pub fn network(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Network, url, op, source)
    }

    /// Create a Parse error.
    pub fn parse(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Parse, url, op, source)
    }

    /// Create a SectionNotFound error.
    pub fn section_not_found(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::SectionNotFound, url, op, source)
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is a Network error.
    pub fn is_network(&self) -> bool {
        self.code == ErrorCode::Network
    }

    /// Returns true if this is a Parse error.
    pub fn is_parse(&self) -> bool {
        self.code == ErrorCode::Parse
    }

    /// Returns true if this is a SectionNotFound error.
    pub fn is_section_not_found(&self) -> bool {
        self.code == ErrorCode::SectionNotFound
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Short reason without the op/url prefix, used inside placeholder prose.
    pub fn reason(&self) -> String {
        match self.source {
            Some(ref src) => src.to_string(),
            None => self.code.to_string(),
        }
    }

    /// Render the statement-stage failure as HTML for the reader, ending with a
    /// direct link to `page_url` so the original problem stays reachable.
    pub fn user_message(&self, page_url: &str, timeout: Duration) -> String {
        let fallback = format!(
            "Error fetching problem statement. The original problem can be viewed \
             <a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">here</a>.",
            page_url
        );
        match self.code {
            ErrorCode::Timeout => format!(
                "<p>Fetching the problem statement timed out after {} seconds. Please try again.</p>{}",
                timeout.as_secs(),
                fallback
            ),
            ErrorCode::Parse | ErrorCode::SectionNotFound => format!(
                "<p>Successfully fetched the page, but failed to parse the problem statement. \
                 The page structure might have changed.</p>{}",
                fallback
            ),
            ErrorCode::Network | ErrorCode::InvalidUrl => {
                format!("<p>An error occurred: {}.</p>{}", self.reason(), fallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://codeforces.com/problemset/problem/1234/C";

    #[test]
    fn display_includes_op_url_code_and_source() {
        let err = ExtractError::network(PAGE, "Fetch", Some(anyhow::anyhow!("HTTP status 503")));
        assert_eq!(
            err.to_string(),
            format!("cfread: Fetch {}: network error: HTTP status 503", PAGE)
        );
    }

    #[test]
    fn predicates_follow_code() {
        let err = ExtractError::timeout(PAGE, "Fetch", None);
        assert!(err.is_timeout());
        assert!(!err.is_network());
        assert!(ExtractError::section_not_found(PAGE, "Editorial", None).is_section_not_found());
        assert!(ExtractError::parse(PAGE, "Statement", None).is_parse());
    }

    #[test]
    fn reason_falls_back_to_code() {
        assert_eq!(ExtractError::parse(PAGE, "Statement", None).reason(), "parse error");
        let err = ExtractError::parse(PAGE, "Statement", Some(anyhow::anyhow!("no container")));
        assert_eq!(err.reason(), "no container");
    }

    #[test]
    fn user_messages_are_distinct_and_link_back() {
        let timeout = Duration::from_secs(15);
        let t = ExtractError::timeout(PAGE, "Fetch", None).user_message(PAGE, timeout);
        let n = ExtractError::network(PAGE, "Fetch", Some(anyhow::anyhow!("HTTP status 404")))
            .user_message(PAGE, timeout);
        let p = ExtractError::parse(PAGE, "Statement", None).user_message(PAGE, timeout);

        assert!(t.contains("timed out after 15 seconds"));
        assert!(n.contains("An error occurred: HTTP status 404."));
        assert!(p.contains("failed to parse the problem statement"));
        for msg in [&t, &n, &p] {
            assert!(msg.contains(&format!("href=\"{}\"", PAGE)));
        }
    }
}
