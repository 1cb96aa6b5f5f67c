//! Check-before-insert passes over `<head>`

use crate::html::{escape_attr, has_tag, insert_after_head_start, insert_before_head_end};
use crate::policy::DomainPolicy;
use crate::url::BaseUrl;
use once_cell::sync::Lazy;
use regex::Regex;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s[^>]*(charset\s*=|http-equiv\s*=\s*["']?content-type)"#)
        .expect("BUG: hardcoded meta charset regex is invalid")
});

static META_VIEWPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s[^>]*name\s*=\s*["']?viewport"#)
        .expect("BUG: hardcoded meta viewport regex is invalid")
});

/// Adds `<meta charset>` and a responsive viewport when missing
pub fn ensure_meta_tags(html: &str) -> String {
    let mut missing = String::new();
    if !META_CHARSET.is_match(html) {
        missing.push_str("<meta charset=\"UTF-8\">\n");
    }
    if !META_VIEWPORT.is_match(html) {
        missing.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    }

    if missing.is_empty() {
        html.to_string()
    } else {
        insert_after_head_start(html, &format!("\n{}", missing))
    }
}

/// Re-adds external stylesheets and font links that are no longer referenced
///
/// Only CDN stylesheets are considered: fetchable ones were either inlined or
/// left in place after a failed fetch. A URL counts as present when it appears
/// anywhere in the document, raw or attribute-escaped.
pub fn ensure_stylesheets_and_fonts(
    html: &str,
    css_urls: &[String],
    font_urls: &[String],
    policy: &DomainPolicy,
) -> String {
    let mut links = String::new();

    let candidates = css_urls
        .iter()
        .filter(|url| policy.classify(url).is_external_reference())
        .chain(font_urls.iter().filter(|url| !policy.is_tracking_url(url)));

    for url in candidates {
        let escaped = escape_attr(url);
        if html.contains(url.as_str()) || html.contains(&escaped) || links.contains(&escaped) {
            continue;
        }
        tracing::debug!("Restoring stylesheet link {}", url);
        links.push_str(&format!("<link rel=\"stylesheet\" href=\"{}\">\n", escaped));
    }

    if links.is_empty() {
        html.to_string()
    } else {
        insert_before_head_end(html, &links)
    }
}

/// Adds `<base href>` pointing at the source directory when no base exists
///
/// Anything the absolutizer could not reach (script-built URLs, unknown
/// attributes) then still resolves against the original site.
pub fn add_base_tag(html: &str, source: &BaseUrl) -> String {
    if has_tag(html, "base") {
        return html.to_string();
    }
    let tag = format!("\n<base href=\"{}\">", escape_attr(source.directory()));
    insert_after_head_start(html, &tag)
}
