use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_mirror::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Extracts the lowercase host from a URL string, if it parses
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url.trim()).ok().as_ref().and_then(extract_domain)
}

/// Returns true when both URLs share scheme, host and port
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && extract_domain(a) == extract_domain(b)
        && a.port_or_known_default() == b.port_or_known_default()
}
