//! Domain policy: which references are trackers, which are CDN assets
//!
//! Every external reference is classified before any network activity. The
//! lists default to [`lists::TRACKING_DOMAINS`] and [`lists::CDN_DOMAINS`] and
//! can be extended or replaced from configuration.

pub mod lists;

use crate::config::PolicyConfig;
use crate::url::{host_of, is_http_url, is_passthrough, matches_domain};

/// Classification of a resource reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    /// Tracker or ad domain - removed, never fetched
    Tracking,
    /// Allow-listed CDN - kept as an external reference, never fetched
    Cdn,
    /// Any other http(s) URL - may be fetched
    Fetchable,
    /// `data:`/`blob:` and other non-network references
    Inline,
    /// Relative or malformed reference that could not be resolved
    Unresolved,
}

impl ResourceClass {
    /// Returns true if the resource may be fetched over the network
    pub fn should_fetch(&self) -> bool {
        matches!(self, Self::Fetchable)
    }

    /// Returns true if the reference must stay untouched in the markup
    pub fn is_external_reference(&self) -> bool {
        matches!(self, Self::Cdn)
    }
}

/// Tracker blocklist and CDN allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPolicy {
    tracking: Vec<String>,
    cdn: Vec<String>,
    signatures: Vec<String>,
    pixels: Vec<String>,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self::new(
            lists::TRACKING_DOMAINS.iter().map(|s| s.to_string()).collect(),
            lists::CDN_DOMAINS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl DomainPolicy {
    /// Creates a policy from explicit lists
    pub fn new(tracking: Vec<String>, cdn: Vec<String>) -> Self {
        Self {
            tracking,
            cdn,
            signatures: lists::TRACKING_SCRIPT_SIGNATURES
                .iter()
                .chain(lists::TRACKING_PIXEL_PATHS)
                .map(|s| s.to_string())
                .collect(),
            pixels: lists::TRACKING_PIXEL_PATHS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Builds the policy described by a `[policy]` table
    pub fn from_config(config: &PolicyConfig) -> Self {
        let mut policy = if config.replace_defaults {
            Self::new(Vec::new(), Vec::new())
        } else {
            Self::default()
        };

        policy
            .tracking
            .extend(config.extra_tracking_domains.iter().cloned());
        policy.cdn.extend(config.extra_cdn_domains.iter().cloned());
        policy
    }

    /// Classifies an absolute or relative reference
    ///
    /// The tracking list takes priority over the CDN list, so a tracker hosted
    /// on a CDN subdomain is still removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_mirror::policy::{DomainPolicy, ResourceClass};
    ///
    /// let policy = DomainPolicy::default();
    /// assert_eq!(
    ///     policy.classify("https://www.googletagmanager.com/gtm.js"),
    ///     ResourceClass::Tracking
    /// );
    /// assert_eq!(
    ///     policy.classify("https://cdnjs.cloudflare.com/a/bootstrap.min.css"),
    ///     ResourceClass::Cdn
    /// );
    /// assert_eq!(policy.classify("https://example.com/site.css"), ResourceClass::Fetchable);
    /// ```
    pub fn classify(&self, url: &str) -> ResourceClass {
        let url = url.trim();

        if is_passthrough(url) {
            return ResourceClass::Inline;
        }

        let candidate = match url.strip_prefix("//") {
            Some(rest) => format!("https://{}", rest),
            None => url.to_string(),
        };

        if !is_http_url(&candidate) {
            return ResourceClass::Unresolved;
        }

        let host = match host_of(&candidate) {
            Some(host) => host,
            None => return ResourceClass::Unresolved,
        };

        if self.is_tracking_host(&host) {
            ResourceClass::Tracking
        } else if self.is_cdn_host(&host) {
            ResourceClass::Cdn
        } else {
            ResourceClass::Fetchable
        }
    }

    /// Returns true if the host belongs to a tracking domain
    pub fn is_tracking_host(&self, host: &str) -> bool {
        self.tracking.iter().any(|d| matches_domain(d, host))
    }

    /// Returns true if the host belongs to an allow-listed CDN
    pub fn is_cdn_host(&self, host: &str) -> bool {
        self.cdn.iter().any(|d| matches_domain(d, host))
    }

    /// Returns true if a reference points at a tracker
    pub fn is_tracking_url(&self, url: &str) -> bool {
        self.classify(url) == ResourceClass::Tracking
    }

    /// Returns true if inline script text looks like an analytics bootstrap
    pub fn is_tracking_script(&self, content: &str) -> bool {
        let lower = content.to_ascii_lowercase();
        self.signatures.iter().any(|s| lower.contains(s.as_str()))
            || self
                .tracking
                .iter()
                .any(|domain| lower.contains(&domain.to_ascii_lowercase()))
    }

    /// Returns true if a reference points at a known pixel endpoint
    pub fn is_tracking_pixel(&self, url: &str) -> bool {
        let lower = url.to_ascii_lowercase();
        self.pixels.iter().any(|p| lower.contains(p.as_str()))
    }

    /// Returns true if free text mentions any tracking domain or pixel endpoint
    pub fn mentions_tracker(&self, text: &str) -> bool {
        let lower = text.to_ascii_lowercase();
        self.tracking
            .iter()
            .any(|domain| lower.contains(&domain.to_ascii_lowercase()))
            || self.pixels.iter().any(|p| lower.contains(p.as_str()))
    }
}
