use url::Url;

/// Query parameters stripped from page keys during crawling
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Canonical key used to deduplicate resource URLs
///
/// Parsing lowercases the host, drops default ports and resolves dot segments;
/// the fragment is removed. Strings that do not parse are keyed by their
/// trimmed text.
pub fn canonical_key(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.trim().to_string(),
    }
}

/// Deduplicates URLs by canonical key, keeping the first occurrence in order
pub fn dedup_urls<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for url in urls {
        let url = url.into();
        if seen.insert(canonical_key(&url)) {
            out.push(url);
        }
    }
    out
}

/// Canonical key used to deduplicate crawled pages
///
/// Stricter than [`canonical_key`]: tracking parameters are removed, the
/// remaining query is sorted and a trailing slash is dropped (except for the
/// root), so `/about/`, `/about#team` and `/about?utm_source=x` are one page.
pub fn page_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> String {
        page_key(&Url::parse(s).unwrap())
    }

    #[test]
    fn test_canonical_key_drops_fragment() {
        assert_eq!(
            canonical_key("https://example.com/a.css#x"),
            "https://example.com/a.css"
        );
    }

    #[test]
    fn test_canonical_key_normalizes_host_and_port() {
        assert_eq!(
            canonical_key("https://EXAMPLE.com:443/a/../b.css"),
            "https://example.com/b.css"
        );
    }

    #[test]
    fn test_canonical_key_keeps_unparseable() {
        assert_eq!(canonical_key("  not a url "), "not a url");
    }

    #[test]
    fn test_dedup_urls_keeps_first() {
        let urls = dedup_urls(vec![
            "https://example.com/a.css",
            "https://EXAMPLE.com/a.css",
            "https://example.com/b.css",
            "https://example.com/a.css#frag",
        ]);
        assert_eq!(
            urls,
            vec!["https://example.com/a.css", "https://example.com/b.css"]
        );
    }

    #[test]
    fn test_page_key_trailing_slash() {
        assert_eq!(key("https://example.com/about/"), "https://example.com/about");
        assert_eq!(key("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn test_page_key_removes_tracking_params() {
        assert_eq!(
            key("https://example.com/page?utm_source=x&fbclid=1"),
            "https://example.com/page"
        );
        assert_eq!(
            key("https://example.com/page?b=2&utm_medium=email&a=1"),
            "https://example.com/page?a=1&b=2"
        );
    }

    #[test]
    fn test_page_key_drops_fragment() {
        assert_eq!(key("https://example.com/about#team"), "https://example.com/about");
    }
}
