use serde::{Deserialize, Serialize};

/// Default per-fetch timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Default number of stylesheets fetched concurrently per batch
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Main configuration structure for Sumi-Mirror
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub import: ImportOptions,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Network fetching configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetchConfig {
    /// Upper bound for any single fetch (milliseconds)
    pub timeout_ms: u64,

    /// TCP connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Number of stylesheets fetched concurrently per batch
    pub batch_size: usize,

    /// Stylesheets larger than this are rejected
    pub max_stylesheet_bytes: usize,

    /// Images larger than this are never turned into data URIs
    pub max_image_bytes: usize,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Same-origin proxy endpoint. When set, every fetch is routed through
    /// `<proxy-url>?url=<encoded>&type=css|html`.
    pub proxy_url: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: 5_000,
            batch_size: DEFAULT_BATCH_SIZE,
            max_stylesheet_bytes: 2 * 1024 * 1024,
            max_image_bytes: 512 * 1024,
            user_agent: format!("SumiMirror/{}", env!("CARGO_PKG_VERSION")),
            proxy_url: None,
        }
    }
}

/// Per-import stage toggles
///
/// Each boolean switches one pipeline stage on or off. The same structure is
/// read from the `[import]` table and may be overridden per call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ImportOptions {
    /// URL the HTML was served from; enables absolutization and the base tag
    pub source_url: Option<String>,
    pub preserve_external_css: bool,
    pub preserve_external_js: bool,
    pub preserve_images: bool,
    pub preserve_fonts: bool,
    pub convert_relative_urls: bool,
    pub inline_external_css: bool,
    pub inline_images: bool,
    pub cleanup_html: bool,
    pub preserve_meta_tags: bool,
    pub preserve_structure: bool,
    /// Overrides `[fetch] timeout-ms` for this import (milliseconds)
    pub fetch_timeout: Option<u64>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            source_url: None,
            preserve_external_css: true,
            preserve_external_js: true,
            preserve_images: true,
            preserve_fonts: true,
            convert_relative_urls: true,
            inline_external_css: true,
            inline_images: false,
            cleanup_html: true,
            preserve_meta_tags: true,
            preserve_structure: true,
            fetch_timeout: None,
        }
    }
}

impl ImportOptions {
    /// Returns a copy of these options bound to `source_url`
    pub fn with_source_url(&self, source_url: &str) -> Self {
        Self {
            source_url: Some(source_url.to_string()),
            ..self.clone()
        }
    }
}

/// Multi-page crawl configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlConfig {
    /// Maximum number of pages imported by one crawl, root included
    pub max_pages: usize,

    /// Number of pages imported at the same time
    pub concurrency: usize,

    /// Pause between two page imports (milliseconds)
    pub delay_between_pages: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 20,
            concurrency: 1,
            delay_between_pages: 250,
        }
    }
}

/// Overrides for the tracking blocklist and CDN allow-list
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PolicyConfig {
    /// Additional tracker domains (suffix match, `*.` prefix allowed)
    pub extra_tracking_domains: Vec<String>,

    /// Additional CDN domains that are never fetched for inlining
    pub extra_cdn_domains: Vec<String>,

    /// Use only the extra lists, dropping the built-in defaults
    pub replace_defaults: bool,
}
