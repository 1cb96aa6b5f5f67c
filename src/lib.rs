//! Sumi-Mirror: a website mirroring and import pipeline
//!
//! This crate fetches a page and its linked stylesheets, extracts design facts
//! (colors, fonts, images, layout, navigation, sections, text), normalizes and
//! sanitizes the markup, and can crawl same-origin internal pages.

pub mod analyze;
pub mod config;
pub mod crawler;
pub mod diagnostics;
pub mod extract;
pub mod fetch;
pub mod html;
pub mod inline;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod policy;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] fetch::FetchError),

    #[error("HTML rewrite error: {0}")]
    Rewrite(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Sumi-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analyze::WebsiteAnalysis;
pub use config::{Config, ImportOptions};
pub use crawler::{DetectedPage, MultiPageImportResult};
pub use diagnostics::{Diagnostics, Issue, IssueKind};
pub use pipeline::{ImportResult, Importer};
pub use crate::url::{resolve, BaseUrl};
