/// Checks if a host falls under a domain pattern
///
/// Blocklist and allow-list entries name a registrable domain; the entry
/// matches the domain itself and every subdomain beneath it. A leading `*.` is
/// accepted and means the same thing.
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::matches_domain;
///
/// assert!(matches_domain("google-analytics.com", "google-analytics.com"));
/// assert!(matches_domain("google-analytics.com", "ssl.google-analytics.com"));
/// assert!(matches_domain("*.example.com", "example.com"));
/// assert!(!matches_domain("example.com", "myexample.com"));
/// ```
pub fn matches_domain(pattern: &str, host: &str) -> bool {
    let base = pattern.strip_prefix("*.").unwrap_or(pattern);
    if base.is_empty() || host.is_empty() {
        return false;
    }

    let host = host.trim_end_matches('.');
    if host.eq_ignore_ascii_case(base) {
        return true;
    }

    if host.len() <= base.len() {
        return false;
    }

    let split = host.len() - base.len();
    host.as_bytes()[split - 1] == b'.'
        && host
            .get(split..)
            .map(|suffix| suffix.eq_ignore_ascii_case(base))
            .unwrap_or(false)
}
