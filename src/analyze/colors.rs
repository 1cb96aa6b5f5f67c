//! Color palette extraction
//!
//! Colors are read from CSS declaration values only, so hex-looking selectors
//! (`#fab`, `#add`) and text content never count.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Maximum number of colors reported
pub const MAX_COLORS: usize = 30;

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([a-z-]+)\s*:\s*([^;{}]+)").expect("BUG: hardcoded declaration regex is invalid")
});

static COLOR_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)#(?:[0-9a-f]{8}|[0-9a-f]{6}|[0-9a-f]{4}|[0-9a-f]{3})\b|\b(?:rgba?|hsla?)\(\s*[^()]*\)|\b[a-z]+\b",
    )
    .expect("BUG: hardcoded color value regex is invalid")
});

static SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("BUG: hardcoded whitespace regex is invalid"));

/// Named colors worth reporting; keywords like `transparent` or `inherit` are not colors
const NAMED_COLORS: &[&str] = &[
    "black", "white", "red", "green", "blue", "yellow", "orange", "purple", "pink", "gray",
    "grey", "silver", "navy", "teal", "maroon", "olive", "lime", "aqua", "cyan", "magenta",
    "fuchsia", "brown", "gold", "indigo", "violet", "crimson", "coral", "salmon", "tomato",
    "turquoise", "beige", "ivory", "khaki", "lavender", "tan", "chocolate", "darkblue",
    "darkgreen", "darkred", "darkgray", "darkgrey", "lightblue", "lightgreen", "lightgray",
    "lightgrey", "whitesmoke", "slategray", "slategrey", "steelblue", "skyblue", "royalblue",
    "midnightblue", "forestgreen", "seagreen", "firebrick", "orangered", "dimgray", "dimgrey",
];

/// Returns true if a property takes a color (or a shorthand that may hold one)
fn is_color_property(property: &str) -> bool {
    let property = property.to_ascii_lowercase();
    property.contains("color")
        || matches!(
            property.as_str(),
            "background" | "border" | "border-top" | "border-right" | "border-bottom"
                | "border-left" | "outline" | "fill" | "stroke" | "box-shadow" | "text-shadow"
        )
        || property.starts_with("--")
}

/// Extracts up to [`MAX_COLORS`] distinct colors from CSS text, in order of appearance
///
/// Hex colors are lowercased and 3/4-digit forms expanded; functional forms
/// lose their whitespace.
///
/// # Examples
///
/// ```
/// use sumi_mirror::analyze::extract_colors;
///
/// let colors = extract_colors("body{color:#FFF;background:rgb(0, 0, 0)} #abc{color:#ffffff}");
/// assert_eq!(colors, vec!["#ffffff", "rgb(0,0,0)"]);
/// ```
pub fn extract_colors(css: &str) -> Vec<String> {
    scan_colors(css).0
}

/// Colors plus whether more distinct colors existed past the cap
pub(crate) fn scan_colors(css: &str) -> (Vec<String>, bool) {
    let mut seen = HashSet::new();
    let mut colors = Vec::new();

    for decl in DECLARATION.captures_iter(css) {
        let takes_color = is_color_property(&decl[1]);

        for m in COLOR_VALUE.find_iter(&decl[2]) {
            if let Some(color) = normalize_color(m.as_str(), takes_color) {
                if seen.insert(color.clone()) {
                    if colors.len() == MAX_COLORS {
                        return (colors, true);
                    }
                    colors.push(color);
                }
            }
        }
    }

    (colors, false)
}

fn normalize_color(token: &str, takes_color: bool) -> Option<String> {
    let lower = token.to_ascii_lowercase();
    if lower.starts_with('#') {
        Some(expand_hex(&lower))
    } else if lower.contains('(') {
        Some(SPACES.replace_all(&lower, "").into_owned())
    } else if takes_color && NAMED_COLORS.contains(&lower.as_str()) {
        Some(lower)
    } else {
        None
    }
}

fn expand_hex(hex: &str) -> String {
    let digits = hex.trim_start_matches('#').to_ascii_lowercase();
    match digits.len() {
        3 | 4 => {
            let mut out = String::from("#");
            for c in digits.chars() {
                out.push(c);
                out.push(c);
            }
            out
        }
        _ => format!("#{}", digits),
    }
}
