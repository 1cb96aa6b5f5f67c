//! Relative to absolute URL resolution
//!
//! Resolution is string based on purpose: it must accept the half-broken
//! references found in real pages and hand back whatever it cannot make sense
//! of, untouched.

/// Schemes that are never treated as network-fetchable
const PASSTHROUGH_PREFIXES: &[&str] = &["data:", "blob:", "mailto:", "tel:", "javascript:", "#"];

/// Resolves `url` against a base origin and base directory
///
/// # Rules
///
/// | Input | Result |
/// |-------|--------|
/// | `https://x.com/a.css` | unchanged |
/// | `//cdn.com/a.css` | `https://cdn.com/a.css` |
/// | `/a.css` | `base_origin + /a.css` |
/// | `../a.css` | one directory popped from `base_path` per `../` |
/// | `./a.css` | `base_path + a.css` |
/// | `a.css` | `base_path + a.css` |
/// | `data:`, `blob:`, `mailto:`, `#frag` | unchanged |
///
/// `base_path` is the directory URL of the document (for example
/// `https://site.com/blog/post/`). Resolution never fails; input it cannot
/// interpret is returned as given.
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::resolve;
///
/// let base = "https://site.com/blog/post/";
/// assert_eq!(resolve("../a.css", "https://site.com", base), "https://site.com/blog/a.css");
/// assert_eq!(resolve("/a.css", "https://site.com", base), "https://site.com/a.css");
/// assert_eq!(resolve("//cdn.com/a.css", "https://site.com", base), "https://cdn.com/a.css");
/// ```
pub fn resolve(url: &str, base_origin: &str, base_path: &str) -> String {
    let trimmed = url.trim();

    if trimmed.is_empty() || is_passthrough(trimmed) {
        return url.to_string();
    }

    if is_http_url(trimmed) {
        return trimmed.to_string();
    }

    if let Some(rest) = trimmed.strip_prefix("//") {
        if rest.is_empty() || rest.starts_with('/') {
            return url.to_string();
        }
        return format!("https://{}", rest);
    }

    // Any other explicit scheme (ftp:, about:, ...) is left alone
    if has_scheme(trimmed) {
        return url.to_string();
    }

    let origin = base_origin.trim_end_matches('/');

    if trimmed.starts_with('/') {
        return format!("{}{}", origin, trimmed);
    }

    let (dir_origin, dir_path) = split_directory(base_path, origin);

    if trimmed.starts_with("../") {
        let mut segments: Vec<&str> = dir_path.split('/').filter(|s| !s.is_empty()).collect();
        let mut rest = trimmed;
        loop {
            if let Some(next) = rest.strip_prefix("../") {
                segments.pop();
                rest = next;
            } else if let Some(next) = rest.strip_prefix("./") {
                rest = next;
            } else {
                break;
            }
        }

        let mut resolved = String::from(dir_origin);
        resolved.push('/');
        for segment in segments {
            resolved.push_str(segment);
            resolved.push('/');
        }
        resolved.push_str(rest);
        return resolved;
    }

    let mut rest = trimmed;
    while let Some(next) = rest.strip_prefix("./") {
        rest = next;
    }

    format!("{}{}{}", dir_origin, dir_path, rest)
}

/// Returns true for `http://` and `https://` URLs (case-insensitive)
pub fn is_http_url(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Returns true for references that must never be fetched or rewritten
pub fn is_passthrough(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    PASSTHROUGH_PREFIXES.iter().any(|p| lower.starts_with(p))
}

fn has_scheme(url: &str) -> bool {
    match url.find(':') {
        Some(idx) if idx > 0 => {
            let scheme = &url[..idx];
            scheme
                .chars()
                .next()
                .map(|c| c.is_ascii_alphabetic())
                .unwrap_or(false)
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        }
        _ => false,
    }
}

/// Splits a directory URL into (origin, path) where path starts and ends with '/'
fn split_directory<'a>(base_path: &'a str, fallback_origin: &'a str) -> (&'a str, String) {
    let (origin, path) = match base_path.find("://") {
        Some(scheme_end) => {
            let after = scheme_end + 3;
            match base_path[after..].find('/') {
                Some(slash) => base_path.split_at(after + slash),
                None => (base_path, ""),
            }
        }
        None => (fallback_origin, base_path),
    };

    let mut path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    // Drop a trailing document name so that "a/b/page.html" resolves from "a/b/"
    if !path.ends_with('/') {
        match path.rfind('/') {
            Some(idx) => path.truncate(idx + 1),
            None => path.push('/'),
        }
    }

    (origin, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://site.com";
    const BASE: &str = "https://site.com/blog/post/";

    #[test]
    fn test_absolute_passes_through() {
        assert_eq!(
            resolve("https://x.com/a.css", ORIGIN, BASE),
            "https://x.com/a.css"
        );
        assert_eq!(resolve("http://x.com/a.css", ORIGIN, BASE), "http://x.com/a.css");
    }

    #[test]
    fn test_protocol_relative() {
        assert_eq!(
            resolve("//cdn.com/a.css", ORIGIN, BASE),
            "https://cdn.com/a.css"
        );
    }

    #[test]
    fn test_root_relative() {
        assert_eq!(resolve("/a.css", ORIGIN, BASE), "https://site.com/a.css");
        assert_eq!(resolve("/a.css", "https://site.com/", BASE), "https://site.com/a.css");
    }

    #[test]
    fn test_parent_directory() {
        assert_eq!(resolve("../a.css", ORIGIN, BASE), "https://site.com/blog/a.css");
        assert_eq!(resolve("../../a.css", ORIGIN, BASE), "https://site.com/a.css");
    }

    #[test]
    fn test_parent_directory_past_root() {
        assert_eq!(resolve("../../../../a.css", ORIGIN, BASE), "https://site.com/a.css");
    }

    #[test]
    fn test_current_directory() {
        assert_eq!(
            resolve("./a.css", ORIGIN, BASE),
            "https://site.com/blog/post/a.css"
        );
        assert_eq!(
            resolve("././a.css", ORIGIN, BASE),
            "https://site.com/blog/post/a.css"
        );
    }

    #[test]
    fn test_bare_relative() {
        assert_eq!(
            resolve("a.css", ORIGIN, BASE),
            "https://site.com/blog/post/a.css"
        );
        assert_eq!(
            resolve("css/a.css", ORIGIN, BASE),
            "https://site.com/blog/post/css/a.css"
        );
    }

    #[test]
    fn test_base_path_with_document_name() {
        assert_eq!(
            resolve("a.css", ORIGIN, "https://site.com/blog/index.html"),
            "https://site.com/blog/a.css"
        );
    }

    #[test]
    fn test_data_and_blob_unchanged() {
        let data = "data:image/png;base64,AAAA";
        assert_eq!(resolve(data, ORIGIN, BASE), data);
        assert_eq!(resolve("blob:https://x/1", ORIGIN, BASE), "blob:https://x/1");
    }

    #[test]
    fn test_non_network_references_unchanged() {
        assert_eq!(resolve("#top", ORIGIN, BASE), "#top");
        assert_eq!(resolve("mailto:a@b.com", ORIGIN, BASE), "mailto:a@b.com");
        assert_eq!(resolve("javascript:void(0)", ORIGIN, BASE), "javascript:void(0)");
        assert_eq!(resolve("ftp://files.site.com/x", ORIGIN, BASE), "ftp://files.site.com/x");
    }

    #[test]
    fn test_malformed_unchanged() {
        assert_eq!(resolve("", ORIGIN, BASE), "");
        assert_eq!(resolve("   ", ORIGIN, BASE), "   ");
        assert_eq!(resolve("//", ORIGIN, BASE), "//");
    }

    #[test]
    fn test_every_variant_shares_site_origin() {
        let inputs = ["../a.css", "./a.css", "/a.css", "a.css", "https://site.com/a.css"];
        for input in inputs {
            let resolved = resolve(input, ORIGIN, BASE);
            assert!(
                resolved.starts_with("https://site.com/"),
                "{} resolved to {}",
                input,
                resolved
            );
        }
    }
}
