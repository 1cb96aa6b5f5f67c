//! URL handling module for Sumi-Mirror
//!
//! This module provides relative URL resolution, canonical dedup keys, origin
//! comparison and domain pattern matching.

mod canonical;
mod domain;
mod matcher;
mod resolve;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use canonical::{canonical_key, dedup_urls, page_key};
pub use domain::{extract_domain, host_of, same_origin};
pub use matcher::matches_domain;
pub use resolve::{is_http_url, is_passthrough, resolve};

/// The location a document was served from, split for [`resolve`]
///
/// Holds the page URL (without fragment), its origin, and its directory URL,
/// so relative references can be resolved without reparsing the page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    page: Url,
    origin: String,
    directory: String,
}

impl BaseUrl {
    /// Parses a document URL
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_mirror::url::BaseUrl;
    ///
    /// let base = BaseUrl::parse("https://site.com/blog/post/index.html#top").unwrap();
    /// assert_eq!(base.origin(), "https://site.com");
    /// assert_eq!(base.directory(), "https://site.com/blog/post/");
    /// assert_eq!(base.resolve("../a.css"), "https://site.com/blog/a.css");
    /// ```
    pub fn parse(page_url: &str) -> UrlResult<Self> {
        let url = Url::parse(page_url.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
        Self::from_url(url)
    }

    /// Builds a base from an already parsed URL
    pub fn from_url(mut url: Url) -> UrlResult<Self> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }
        if url.host_str().is_none() {
            return Err(UrlError::MissingDomain);
        }

        url.set_fragment(None);
        let origin = url.origin().ascii_serialization();
        let path = url.path();
        let dir_end = path.rfind('/').map(|i| i + 1).unwrap_or(0);
        let mut directory = format!("{}{}", origin, &path[..dir_end]);
        if !directory.ends_with('/') {
            directory.push('/');
        }

        Ok(Self {
            page: url,
            origin,
            directory,
        })
    }

    /// The page URL this base was built from
    pub fn url(&self) -> &Url {
        &self.page
    }

    /// The page URL as a string
    pub fn as_str(&self) -> &str {
        self.page.as_str()
    }

    /// `scheme://host[:port]` without trailing slash
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Directory URL of the page, always ending in `/`
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Resolves a reference found in this document
    pub fn resolve(&self, reference: &str) -> String {
        resolve(reference, &self.origin, &self.directory)
    }
}

/// Resolves `reference` against an optional base; without a base it is returned as-is
pub fn resolve_with(base: Option<&BaseUrl>, reference: &str) -> String {
    match base {
        Some(base) => base.resolve(reference),
        None => reference.trim().to_string(),
    }
}
