//! Font family extraction

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Maximum number of font families reported
pub const MAX_FONTS: usize = 10;

static FONT_FAMILY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)font-family\s*:\s*([^;{}]+)").expect("BUG: hardcoded font-family regex is invalid")
});

static FONT_SHORTHAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[;{\s])font\s*:[^;{}]*?\d+(?:\.\d+)?(?:px|pt|em|rem|%|vw|vh)(?:/\S+)?\s+([^;{}]+)")
        .expect("BUG: hardcoded font shorthand regex is invalid")
});

const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
    "ui-serif",
    "ui-sans-serif",
    "ui-monospace",
    "ui-rounded",
    "-apple-system",
    "blinkmacsystemfont",
    "emoji",
    "math",
    "fangsong",
    "inherit",
    "initial",
    "unset",
    "revert",
    "apple color emoji",
    "segoe ui emoji",
    "segoe ui symbol",
    "noto color emoji",
];

/// Extracts up to [`MAX_FONTS`] font families
///
/// Google Fonts `family` parameters come first (in URL order), then
/// `font-family` declarations in CSS order. Generic keywords and `var()`
/// references are dropped; names are deduplicated case-insensitively.
///
/// # Examples
///
/// ```
/// use sumi_mirror::analyze::extract_fonts;
///
/// let urls = vec!["https://fonts.googleapis.com/css2?family=Inter:wght@400;700&family=Roboto+Mono".to_string()];
/// let css = "body { font-family: 'Inter', -apple-system, sans-serif } h1 { font-family: Georgia, serif }";
/// assert_eq!(extract_fonts(&urls, css), vec!["Inter", "Roboto Mono", "Georgia"]);
/// ```
pub fn extract_fonts(font_urls: &[String], css: &str) -> Vec<String> {
    scan_fonts(font_urls, css).0
}

/// Families plus whether more existed past the cap
pub(crate) fn scan_fonts(font_urls: &[String], css: &str) -> (Vec<String>, bool) {
    let mut seen = HashSet::new();
    let mut fonts = Vec::new();

    // Both declaration forms, merged back into CSS order
    let mut lists: Vec<(usize, &str)> = FONT_FAMILY
        .captures_iter(css)
        .chain(FONT_SHORTHAND.captures_iter(css))
        .filter_map(|cap| cap.get(1))
        .map(|m| (m.start(), m.as_str()))
        .collect();
    lists.sort_by_key(|(offset, _)| *offset);

    let declared = lists
        .into_iter()
        .flat_map(|(_, list)| split_family_list(list))
        .collect::<Vec<_>>();

    let candidates = font_urls
        .iter()
        .flat_map(|url| google_font_families(url))
        .chain(declared);

    for family in candidates {
        if seen.insert(family.to_ascii_lowercase()) {
            if fonts.len() == MAX_FONTS {
                return (fonts, true);
            }
            fonts.push(family);
        }
    }

    (fonts, false)
}

/// Family names requested by a Google Fonts stylesheet URL
///
/// Handles both the `css` API (`family=A:400|B`) and `css2`
/// (`family=A:wght@400&family=B`).
pub fn google_font_families(url: &str) -> Vec<String> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return Vec::new(),
    };
    if !parsed
        .host_str()
        .is_some_and(|h| h.eq_ignore_ascii_case("fonts.googleapis.com"))
    {
        return Vec::new();
    }

    parsed
        .query_pairs()
        .filter(|(key, _)| key == "family")
        .flat_map(|(_, value)| {
            value
                .split('|')
                .map(|spec| spec.split(':').next().unwrap_or("").trim().to_string())
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}

fn split_family_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|name| {
            name.trim()
                .trim_end_matches("!important")
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .trim()
                .to_string()
        })
        .filter(|name| {
            !name.is_empty()
                && !name.starts_with("var(")
                && !GENERIC_FAMILIES.contains(&name.to_ascii_lowercase().as_str())
        })
        .collect()
}
