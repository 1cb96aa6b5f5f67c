//! Resource reference extraction
//!
//! Stylesheets, scripts, fonts and images referenced by a document, resolved
//! to absolute URLs and deduplicated in document order.

use crate::html::select_all;
use crate::policy::DomainPolicy;
use crate::url::{dedup_urls, is_passthrough, resolve_with, BaseUrl};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde::Serialize;

/// Any of the three shapes a stylesheet link takes in the wild
const STYLESHEET_SELECTOR: &str =
    r#"link[rel~="stylesheet"][href], link[href$=".css"], link[href*=".css?"]"#;

static FONT_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"@import\s+(?:url\(\s*)?['"]?((?:https?:)?//fonts\.(?:googleapis|gstatic)\.com/[^'")\s;]+)"#,
    )
    .expect("BUG: hardcoded font import regex is invalid")
});

static BACKGROUND_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"background(?:-image)?\s*:[^;}]*?url\(\s*['"]?([^'")]+?)['"]?\s*\)"#)
        .expect("BUG: hardcoded background url regex is invalid")
});

/// References found in one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedResources {
    pub css: Vec<String>,
    pub js: Vec<String>,
    pub fonts: Vec<String>,
    pub images: Vec<String>,
}

impl ExtractedResources {
    /// Drops every reference pointing at a tracker
    pub fn without_trackers(mut self, policy: &DomainPolicy) -> Self {
        self.css.retain(|u| !policy.is_tracking_url(u));
        self.js.retain(|u| !policy.is_tracking_url(u));
        self.fonts.retain(|u| !policy.is_tracking_url(u));
        self.images.retain(|u| !policy.is_tracking_url(u));
        self
    }
}

/// Extracts resource references from `html`
///
/// Every reference is resolved against `base` when one is given. `data:` and
/// `blob:` references are skipped.
///
/// # Examples
///
/// ```
/// use sumi_mirror::extract::extract_resources;
/// use sumi_mirror::url::BaseUrl;
///
/// let base = BaseUrl::parse("https://example.com/").unwrap();
/// let html = r#"<link rel="stylesheet" href="/a.css"><link href="/a.css" rel="stylesheet">"#;
/// let found = extract_resources(html, Some(&base));
/// assert_eq!(found.css, vec!["https://example.com/a.css"]);
/// ```
pub fn extract_resources(html: &str, base: Option<&BaseUrl>) -> ExtractedResources {
    let document = Html::parse_document(html);
    let resolve = |reference: &str| resolve_with(base, reference);

    let css = collect_stylesheets(&document, base);

    let js = dedup_urls(
        select_all(&document, "script[src]")
            .into_iter()
            .filter_map(|el| el.value().attr("src"))
            .filter(|src| usable(src))
            .map(resolve),
    );

    let mut fonts: Vec<String> = select_all(&document, "link[href]")
        .into_iter()
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| is_font_host(href))
        .map(resolve)
        .collect();

    let mut images: Vec<String> = Vec::new();
    for img in select_all(&document, "img") {
        if let Some(src) = img.value().attr("src").filter(|s| usable(s)) {
            images.push(resolve(src));
        }
        if let Some(first) = img.value().attr("srcset").and_then(first_srcset_candidate) {
            images.push(resolve(first));
        }
    }
    for source in select_all(&document, "picture source[srcset]") {
        if let Some(first) = source.value().attr("srcset").and_then(first_srcset_candidate) {
            images.push(resolve(first));
        }
    }

    for style in select_all(&document, "style") {
        let text: String = style.text().collect();
        fonts.extend(
            FONT_IMPORT
                .captures_iter(&text)
                .map(|cap| resolve(&cap[1])),
        );
        images.extend(background_urls(&text).map(|u| resolve(&u)));
    }
    for el in select_all(&document, "[style]") {
        if let Some(style) = el.value().attr("style") {
            images.extend(background_urls(style).map(|u| resolve(&u)));
        }
    }

    ExtractedResources {
        css,
        js,
        fonts: dedup_urls(fonts),
        images: dedup_urls(images),
    }
}

/// Absolute URLs of every linked stylesheet, in document order
pub fn extract_stylesheet_urls(html: &str, base: Option<&BaseUrl>) -> Vec<String> {
    collect_stylesheets(&Html::parse_document(html), base)
}

fn collect_stylesheets(document: &Html, base: Option<&BaseUrl>) -> Vec<String> {
    dedup_urls(
        select_all(document, STYLESHEET_SELECTOR)
            .into_iter()
            .filter(|el| {
                // `<link rel="preload" href="x.css">` is not a stylesheet
                let rel = el.value().attr("rel").unwrap_or("stylesheet");
                rel.split_ascii_whitespace()
                    .any(|r| r.eq_ignore_ascii_case("stylesheet"))
                    || !rel.to_ascii_lowercase().contains("preload")
            })
            .filter_map(|el| el.value().attr("href"))
            .filter(|href| usable(href))
            .map(|href| resolve_with(base, href)),
    )
}

fn usable(reference: &str) -> bool {
    let reference = reference.trim();
    !reference.is_empty() && !is_passthrough(reference)
}

fn is_font_host(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    lower.contains("fonts.googleapis.com") || lower.contains("fonts.gstatic.com")
}

/// First URL of a `srcset` list (`a.jpg 1x, b.jpg 2x` → `a.jpg`)
fn first_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .next()
        .and_then(|candidate| candidate.split_ascii_whitespace().next())
        .filter(|url| usable(url))
}

fn background_urls(css: &str) -> impl Iterator<Item = String> + '_ {
    BACKGROUND_URL
        .captures_iter(css)
        .map(|cap| cap[1].trim().to_string())
        .filter(|url| usable(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseUrl {
        BaseUrl::parse("https://example.com/blog/post/").unwrap()
    }

    #[test]
    fn test_stylesheet_attribute_orders() {
        let html = r#"
            <link rel="stylesheet" href="/main.css">
            <link href="theme.css" rel="stylesheet">
            <link href="print.css?v=2" media="print">
            <link rel="icon" href="/favicon.ico">
        "#;
        let found = extract_resources(html, Some(&base()));
        assert_eq!(
            found.css,
            vec![
                "https://example.com/main.css",
                "https://example.com/blog/post/theme.css",
                "https://example.com/blog/post/print.css?v=2",
            ]
        );
    }

    #[test]
    fn test_dedup_after_resolution() {
        let html = r#"
            <link rel="stylesheet" href="../post/a.css">
            <link rel="stylesheet" href="./a.css">
            <link rel="stylesheet" href="https://example.com/blog/post/a.css#x">
        "#;
        let found = extract_resources(html, Some(&base()));
        assert_eq!(found.css, vec!["https://example.com/blog/post/a.css"]);
    }

    #[test]
    fn test_scripts_and_fonts() {
        let html = r#"
            <link href="https://fonts.googleapis.com/css2?family=Inter" rel="stylesheet">
            <style>@import url('https://fonts.googleapis.com/css2?family=Lato');</style>
            <script src="/app.js"></script>
            <script>console.log(1)</script>
        "#;
        let found = extract_resources(html, Some(&base()));
        assert_eq!(found.js, vec!["https://example.com/app.js"]);
        assert_eq!(
            found.fonts,
            vec![
                "https://fonts.googleapis.com/css2?family=Inter",
                "https://fonts.googleapis.com/css2?family=Lato",
            ]
        );
    }

    #[test]
    fn test_images_from_src_srcset_and_background() {
        let html = r#"
            <img src="a.png" srcset="a-small.png 480w, a-large.png 1080w">
            <img src="data:image/png;base64,AAAA">
            <div style="background-image: url('/hero.jpg')"></div>
            <style>.x { background: #fff url(bg.png) no-repeat; }</style>
        "#;
        let found = extract_resources(html, Some(&base()));
        assert_eq!(
            found.images,
            vec![
                "https://example.com/blog/post/a.png",
                "https://example.com/blog/post/a-small.png",
                "https://example.com/blog/post/bg.png",
                "https://example.com/hero.jpg",
            ]
        );
    }

    #[test]
    fn test_without_base_keeps_references() {
        let found = extract_resources(r#"<link rel="stylesheet" href="/a.css">"#, None);
        assert_eq!(found.css, vec!["/a.css"]);
    }

    #[test]
    fn test_without_trackers() {
        let html = r#"
            <script src="https://www.googletagmanager.com/gtm.js?id=GTM-1"></script>
            <script src="https://example.com/app.js"></script>
        "#;
        let found = extract_resources(html, None).without_trackers(&DomainPolicy::default());
        assert_eq!(found.js, vec!["https://example.com/app.js"]);
    }

    #[test]
    fn test_first_srcset_candidate() {
        assert_eq!(first_srcset_candidate("a.jpg 1x, b.jpg 2x"), Some("a.jpg"));
        assert_eq!(first_srcset_candidate("  "), None);
    }
}
