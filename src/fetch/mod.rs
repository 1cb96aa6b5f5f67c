//! Fetch orchestration
//!
//! This module handles every network request made by the pipeline:
//! - Building the HTTP client from `[fetch]` configuration
//! - Direct or proxy-routed requests
//! - Per-request timeouts and size limits
//! - Batched concurrent fetching with input-order results
//! - Error classification into soft failures

mod batch;
mod fetcher;

pub use batch::{fetch_batched, BatchOutcome};
pub use fetcher::{build_http_client, Fetched, FetchMode, Fetcher, ResourceKind};

use crate::diagnostics::{Issue, IssueKind};
use thiserror::Error;

/// Why a single fetch did not produce a usable body
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Network error: {message}")]
    Network { url: String, message: String },

    #[error("HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("Expected {expected}, got {content_type}")]
    ContentTypeMismatch {
        url: String,
        expected: &'static str,
        content_type: String,
    },

    #[error("Blocked by tracking policy")]
    Blocked { url: String },

    #[error("Response exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },

    #[error("Cannot fetch non-http URL")]
    InvalidUrl { url: String },
}

impl FetchError {
    /// The URL the failed request was for
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. }
            | Self::Network { url, .. }
            | Self::Status { url, .. }
            | Self::ContentTypeMismatch { url, .. }
            | Self::Blocked { url }
            | Self::TooLarge { url, .. }
            | Self::InvalidUrl { url } => url,
        }
    }

    /// Diagnostic category for this failure
    pub fn issue_kind(&self) -> IssueKind {
        match self {
            Self::Timeout { .. } | Self::Network { .. } | Self::Status { .. } => IssueKind::Network,
            Self::ContentTypeMismatch { .. } => IssueKind::ContentTypeMismatch,
            Self::Blocked { .. } => IssueKind::Blocked,
            Self::TooLarge { .. } => IssueKind::SizeLimitExceeded,
            Self::InvalidUrl { .. } => IssueKind::ParseAmbiguity,
        }
    }

    /// Converts the failure into a diagnostic entry
    pub fn to_issue(&self) -> Issue {
        Issue::for_url(self.issue_kind(), self.url(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_issue() {
        let err = FetchError::Timeout {
            url: "https://a.com/x.css".to_string(),
            timeout_ms: 1000,
        };
        let issue = err.to_issue();
        assert_eq!(issue.kind, IssueKind::Network);
        assert_eq!(issue.url.as_deref(), Some("https://a.com/x.css"));
        assert_eq!(issue.message, "Request timed out after 1000ms");
    }

    #[test]
    fn test_mismatch_issue() {
        let err = FetchError::ContentTypeMismatch {
            url: "https://a.com/x.css".to_string(),
            expected: "CSS",
            content_type: "text/html".to_string(),
        };
        assert_eq!(err.issue_kind(), IssueKind::ContentTypeMismatch);
        assert_eq!(err.to_string(), "Expected CSS, got text/html");
    }
}
