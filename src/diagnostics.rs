//! Soft-failure accumulator shared by every pipeline stage
//!
//! Resource-level problems never abort an import. Stages push an [`Issue`]
//! into the [`Diagnostics`] owned by the in-flight call and carry on.

use serde::Serialize;
use std::fmt;

/// Category of a non-fatal problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// Fetch failed, timed out, or returned a non-2xx status
    Network,
    /// HTML was returned where a stylesheet was expected
    ContentTypeMismatch,
    /// Nothing matched where something was expected
    ParseAmbiguity,
    /// A fragment could not be turned into a valid document shell
    Structure,
    /// Output was truncated to respect a size cap
    SizeLimitExceeded,
    /// Reference skipped by the tracking blocklist
    Blocked,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::ContentTypeMismatch => "content-type-mismatch",
            Self::ParseAmbiguity => "parse-ambiguity",
            Self::Structure => "structure",
            Self::SizeLimitExceeded => "size-limit-exceeded",
            Self::Blocked => "blocked",
        };
        f.write_str(label)
    }
}

/// One recorded problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: None,
            message: message.into(),
        }
    }

    pub fn for_url(kind: IssueKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: Some(url.into()),
            message: message.into(),
        }
    }

    /// Same issue with its message prefixed, used when merging page results
    pub fn in_context(&self, context: &str) -> Self {
        Self {
            kind: self.kind,
            url: self.url.clone(),
            message: format!("{}: {}", context, self.message),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "[{}] {} ({})", self.kind, self.message, url),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// Append-only error and warning lists for one call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, issue: Issue) {
        tracing::warn!("{}", issue);
        self.errors.push(issue);
    }

    pub fn warn(&mut self, issue: Issue) {
        tracing::debug!("{}", issue);
        self.warnings.push(issue);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}
