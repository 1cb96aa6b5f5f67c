//! Shared HTML helpers
//!
//! Read-only queries go through `scraper`; mutations stream through
//! `lol_html` so the markup that is not touched is emitted byte for byte.

use crate::MirrorError;
use lol_html::{HtmlRewriter, Settings};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("BUG: hardcoded whitespace regex is invalid"));

/// Runs one streaming rewrite pass over `html`
pub fn rewrite(html: &str, settings: Settings<'_, '_>) -> Result<String, MirrorError> {
    let mut output = Vec::with_capacity(html.len());

    let mut rewriter = HtmlRewriter::new(settings, |c: &[u8]| output.extend_from_slice(c));
    rewriter
        .write(html.as_bytes())
        .map_err(|e| MirrorError::Rewrite(e.to_string()))?;
    rewriter
        .end()
        .map_err(|e| MirrorError::Rewrite(e.to_string()))?;

    String::from_utf8(output).map_err(|e| MirrorError::Rewrite(e.to_string()))
}

/// Selects every element matching `css` in document order
///
/// An invalid selector selects nothing.
pub fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Selects descendants of `element` matching `css` in document order
pub fn select_in<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => element.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Text content of an element with whitespace runs collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Collapses whitespace runs into single spaces and trims
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// ASCII case-insensitive substring search returning a byte offset
pub fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

/// Returns true if an opening tag `<name` appears in the markup
pub fn has_tag(html: &str, name: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    let needle = format!("<{}", name.to_ascii_lowercase());
    lower.match_indices(&needle).any(|(idx, _)| {
        matches!(
            lower.as_bytes().get(idx + needle.len()),
            Some(b' ' | b'>' | b'/' | b'\t' | b'\n' | b'\r')
        )
    })
}

/// Counts opening tags `<name` in the markup
pub fn count_tags(html: &str, name: &str) -> usize {
    let lower = html.to_ascii_lowercase();
    let needle = format!("<{}", name.to_ascii_lowercase());
    lower
        .match_indices(&needle)
        .filter(|(idx, _)| {
            matches!(
                lower.as_bytes().get(idx + needle.len()),
                Some(b' ' | b'>' | b'/' | b'\t' | b'\n' | b'\r')
            )
        })
        .count()
}

/// Inserts `snippet` right before `</head>`
///
/// Falls back to just before `<body`, then to the very start of the document.
pub fn insert_before_head_end(html: &str, snippet: &str) -> String {
    if let Some(idx) = find_ci(html, "</head>") {
        return splice(html, idx, snippet);
    }
    if let Some(idx) = find_open_tag(html, "body") {
        return splice(html, idx, snippet);
    }
    format!("{}{}", snippet, html)
}

/// Inserts `snippet` right after the opening `<head ...>` tag
///
/// Falls back to [`insert_before_head_end`] when there is no head tag.
pub fn insert_after_head_start(html: &str, snippet: &str) -> String {
    if let Some(start) = find_open_tag(html, "head") {
        if let Some(close) = html[start..].find('>') {
            return splice(html, start + close + 1, snippet);
        }
    }
    insert_before_head_end(html, snippet)
}

/// Byte offset of the first `<name` opening tag
pub fn find_open_tag(html: &str, name: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let needle = format!("<{}", name.to_ascii_lowercase());
    lower.match_indices(&needle).map(|(idx, _)| idx).find(|idx| {
        matches!(
            lower.as_bytes().get(idx + needle.len()),
            Some(b' ' | b'>' | b'/' | b'\t' | b'\n' | b'\r')
        )
    })
}

/// Escapes a value for use inside a double-quoted attribute
pub fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn splice(html: &str, idx: usize, snippet: &str) -> String {
    let mut out = String::with_capacity(html.len() + snippet.len());
    out.push_str(&html[..idx]);
    out.push_str(snippet);
    out.push_str(&html[idx..]);
    out
}
