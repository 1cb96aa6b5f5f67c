//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and the report
//! values they receive.

use crate::analyze::WebsiteAnalysis;
use crate::crawler::{DetectedPage, MultiPageImportResult};
use crate::pipeline::ImportResult;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// What a command produced
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Import(ImportResult),
    Analysis(Box<WebsiteAnalysis>),
    Site(MultiPageImportResult),
    Pages(Vec<DetectedPage>),
}

impl Report {
    /// Error count, used for the process exit status
    pub fn error_count(&self) -> usize {
        match self {
            Self::Import(result) => result.errors.len(),
            Self::Analysis(_) | Self::Pages(_) => 0,
            Self::Site(result) => result.errors.len(),
        }
    }
}

/// Trait for output handlers
///
/// Implementors decide where a [`Report`] ends up: a terminal, a file, a
/// directory of mirrored pages.
pub trait OutputHandler {
    /// Writes one report
    fn emit(&mut self, report: &Report) -> OutputResult<()>;
}
