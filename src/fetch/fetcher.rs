//! HTTP fetcher implementation
//!
//! This module handles single requests, including:
//! - Building HTTP clients with the configured user agent
//! - Routing through the same-origin proxy when one is configured
//! - Timeout enforcement per request
//! - Size limits while reading the body
//! - Sniffing HTML served where a stylesheet was expected
//! - Error classification

use crate::config::FetchConfig;
use crate::fetch::FetchError;
use crate::policy::DomainPolicy;
use crate::url::is_http_url;
use crate::MirrorError;
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Where requests are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchMode {
    /// Request the target URL directly (server context)
    Direct,
    /// Request `<endpoint>?url=<encoded>&type=<kind>` (browser context)
    Proxy { endpoint: Url },
}

/// What a fetched body is expected to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Html,
    Css,
    Image,
}

impl ResourceKind {
    /// Value of the proxy `type` query parameter
    pub fn proxy_type(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Css => "css",
            Self::Image => "image",
        }
    }

    fn accept_header(&self) -> &'static str {
        match self {
            Self::Html => "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            Self::Css => "text/css,*/*;q=0.1",
            Self::Image => "image/avif,image/webp,image/apng,image/*,*/*;q=0.8",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Html => "HTML",
            Self::Css => "CSS",
            Self::Image => "an image",
        }
    }
}

/// A successfully fetched body
#[derive(Debug, Clone)]
pub struct Fetched {
    /// The URL that was asked for
    pub url: String,
    /// Final URL after redirects (the proxy URL in proxy mode)
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value, empty when absent
    pub content_type: String,
    /// Raw body
    pub body: Vec<u8>,
}

impl Fetched {
    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use sumi_mirror::config::FetchConfig;
/// use sumi_mirror::fetch::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues bounded, policy-checked requests
///
/// Cloning is cheap: the client and the policy are shared.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    mode: FetchMode,
    policy: Arc<DomainPolicy>,
    default_timeout: Duration,
    max_stylesheet_bytes: usize,
    max_image_bytes: usize,
}

impl Fetcher {
    /// Creates a fetcher from `[fetch]` configuration
    pub fn new(config: &FetchConfig, policy: Arc<DomainPolicy>) -> Result<Self, MirrorError> {
        let client = build_http_client(config)?;
        let mode = match &config.proxy_url {
            Some(endpoint) => FetchMode::Proxy {
                endpoint: Url::parse(endpoint)?,
            },
            None => FetchMode::Direct,
        };

        Ok(Self {
            client,
            mode,
            policy,
            default_timeout: Duration::from_millis(config.timeout_ms),
            max_stylesheet_bytes: config.max_stylesheet_bytes,
            max_image_bytes: config.max_image_bytes,
        })
    }

    /// The routing mode in use
    pub fn mode(&self) -> &FetchMode {
        &self.mode
    }

    /// Timeout applied when the caller does not override it
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Fetches one resource
    ///
    /// # Request Flow
    ///
    /// 1. Reject non-http URLs and tracker URLs without touching the network
    /// 2. Build the direct or proxied request URL
    /// 3. Send with the per-request `timeout`; expiry aborts the request
    /// 4. Non-2xx → `Status`
    /// 5. Read the body up to the size limit for `kind`
    /// 6. For CSS, HTML content (by header or by sniffing) → `ContentTypeMismatch`
    pub async fn fetch(
        &self,
        url: &str,
        kind: ResourceKind,
        timeout: Duration,
    ) -> Result<Fetched, FetchError> {
        if !is_http_url(url) {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        if self.policy.is_tracking_url(url) {
            tracing::debug!("Skipping tracker {}", url);
            return Err(FetchError::Blocked {
                url: url.to_string(),
            });
        }

        let request_url = self.request_url(url, kind)?;
        tracing::debug!("Fetching {} ({:?}) via {}", url, kind, request_url);

        match tokio::time::timeout(timeout, self.send(request_url, url, kind)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    fn request_url(&self, url: &str, kind: ResourceKind) -> Result<Url, FetchError> {
        match &self.mode {
            FetchMode::Direct => Url::parse(url).map_err(|_| FetchError::InvalidUrl {
                url: url.to_string(),
            }),
            FetchMode::Proxy { endpoint } => {
                let mut proxied = endpoint.clone();
                proxied
                    .query_pairs_mut()
                    .append_pair("url", url)
                    .append_pair("type", kind.proxy_type());
                Ok(proxied)
            }
        }
    }

    fn size_limit(&self, kind: ResourceKind) -> Option<usize> {
        match kind {
            ResourceKind::Html => None,
            ResourceKind::Css => Some(self.max_stylesheet_bytes),
            ResourceKind::Image => Some(self.max_image_bytes),
        }
    }

    async fn send(
        &self,
        request_url: Url,
        url: &str,
        kind: ResourceKind,
    ) -> Result<Fetched, FetchError> {
        let mut response = self
            .client
            .get(request_url)
            .header("Accept", kind.accept_header())
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let limit = self.size_limit(kind);
        if let (Some(limit), Some(expected)) = (limit, response.content_length()) {
            if expected > limit as u64 {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    limit,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?
        {
            if let Some(limit) = limit {
                if body.len() + chunk.len() > limit {
                    return Err(FetchError::TooLarge {
                        url: url.to_string(),
                        limit,
                    });
                }
            }
            body.extend_from_slice(&chunk);
        }

        if kind == ResourceKind::Css && looks_like_html(&content_type, &body) {
            return Err(FetchError::ContentTypeMismatch {
                url: url.to_string(),
                expected: kind.label(),
                content_type: if content_type.is_empty() {
                    "HTML document".to_string()
                } else {
                    content_type
                },
            });
        }

        Ok(Fetched {
            url: url.to_string(),
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Returns true if a response is an HTML page rather than the expected asset
///
/// Error pages and login walls are frequently served with a 200 status.
fn looks_like_html(content_type: &str, body: &[u8]) -> bool {
    if content_type.to_ascii_lowercase().contains("text/html") {
        return true;
    }

    let head: String = String::from_utf8_lossy(&body[..body.len().min(256)])
        .trim_start_matches('\u{feff}')
        .trim_start()
        .chars()
        .take(15)
        .collect::<String>()
        .to_ascii_lowercase();

    head.starts_with("<!doctype html") || head.starts_with("<html")
}

fn classify_reqwest_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout_ms: 0,
        }
    } else if e.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
