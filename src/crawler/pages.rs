//! Internal page discovery
//!
//! Finds the pages of the same site linked from a document, for a later
//! multi-page import.

use crate::html::{element_text, select_all};
use crate::url::{page_key, same_origin};
use scraper::Html;
use serde::Serialize;
use std::collections::HashSet;
use url::Url;

/// Extensions of links that point at files rather than pages
const BINARY_EXTENSIONS: &[&str] = &[
    "pdf", "zip", "rar", "7z", "tar", "gz", "dmg", "exe", "msi", "apk", "png", "jpg", "jpeg",
    "gif", "svg", "webp", "avif", "ico", "bmp", "mp3", "mp4", "wav", "webm", "mov", "avi",
    "doc", "docx", "xls", "xlsx", "ppt", "pptx", "csv", "css", "js", "json", "xml", "rss",
    "woff", "woff2", "ttf", "otf", "eot",
];

/// Extensions dropped when deriving a file name from a page path
const PAGE_EXTENSIONS: &[&str] = &["html", "htm", "php", "asp", "aspx", "jsp"];

/// A same-site page linked from the analyzed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPage {
    /// Absolute URL, fragment removed
    pub url: String,
    /// Link text, or the path when the link has no text
    pub title: String,
    pub path: String,
    /// `index.html` for the home page, otherwise path segments joined by `-`
    pub suggested_filename: String,
    pub is_external: bool,
}

/// Detects internal pages linked from `html`
///
/// # Link Selection Rules
///
/// **Include:**
/// - `<a href>` resolving to the same scheme, host and port as `source`
///
/// **Exclude:**
/// - Other origins
/// - Links to files (images, archives, documents, fonts, ...)
/// - `download` links, fragment-only links, `javascript:`/`mailto:`/`tel:`/`data:`
///
/// Pages are deduplicated by page key (fragment, tracking parameters and
/// trailing slash ignored). The index page, if linked, comes first; the rest
/// keep document order.
///
/// # Example
///
/// ```
/// use sumi_mirror::crawler::detect_internal_pages;
/// use url::Url;
///
/// let source = Url::parse("https://example.com/").unwrap();
/// let html = r#"<a href="/about">About</a><a href="https://other.com/">Other</a>"#;
/// let pages = detect_internal_pages(html, &source);
/// assert_eq!(pages.len(), 1);
/// assert_eq!(pages[0].suggested_filename, "about.html");
/// ```
pub fn detect_internal_pages(html: &str, source: &Url) -> Vec<DetectedPage> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut pages = Vec::new();

    for anchor in select_all(&document, "a[href]") {
        if anchor.value().attr("download").is_some() {
            continue;
        }

        let href = anchor.value().attr("href").unwrap_or("").trim();
        let url = match resolve_link(href, source) {
            Some(url) => url,
            None => continue,
        };

        if !same_origin(&url, source) || is_binary(&url) {
            continue;
        }

        if !seen.insert(page_key(&url)) {
            continue;
        }

        let path = url.path().to_string();
        let text = element_text(anchor);
        let title = if text.is_empty() {
            anchor
                .value()
                .attr("title")
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| path.clone())
        } else {
            text
        };

        pages.push(DetectedPage {
            url: url.to_string(),
            title,
            suggested_filename: suggested_filename(&url),
            path,
            is_external: false,
        });
    }

    // Stable: non-index pages keep document order
    pages.sort_by_key(|page| !is_index_path(&page.path));
    pages
}

/// File name a page is saved under: `/` → `index.html`, `/docs/intro/` → `docs-intro.html`
pub fn suggested_filename(url: &Url) -> String {
    let segments: Vec<String> = url
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(sanitize_segment)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if segments.is_empty() {
        return "index.html".to_string();
    }
    format!("{}.html", segments.join("-"))
}

/// Resolves a link href to an absolute http(s) URL without fragment
fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let lower = href.to_ascii_lowercase();
    if href.is_empty()
        || href.starts_with('#')
        || ["javascript:", "mailto:", "tel:", "data:"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

fn extension(url: &Url) -> Option<String> {
    let last = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let (_, ext) = last.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

fn is_binary(url: &Url) -> bool {
    extension(url).is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.as_str()))
}

fn is_index_path(path: &str) -> bool {
    let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    let stem = last.split('.').next().unwrap_or("").to_ascii_lowercase();
    stem.is_empty() || stem == "index" || stem == "home" || stem == "default"
}

fn sanitize_segment(segment: &str) -> String {
    let stem = match segment.rsplit_once('.') {
        Some((stem, ext)) if PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => stem,
        _ => segment,
    };
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}
