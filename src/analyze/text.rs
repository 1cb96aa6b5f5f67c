//! Visible text samples

use crate::html::{collapse_whitespace, element_text, select_all};
use scraper::{ElementRef, Html};
use serde::Serialize;
use std::collections::HashSet;

pub const MAX_HEADINGS: usize = 15;
pub const MAX_PARAGRAPHS: usize = 10;
pub const MAX_BUTTONS: usize = 10;
pub const MAX_LIST_ITEMS: usize = 20;

const PARAGRAPH_MIN_CHARS: usize = 20;
const PARAGRAPH_MAX_CHARS: usize = 500;

/// Anything a visitor would click as a button
const BUTTON_SELECTOR: &str = r#"button, a.btn, a.button, [class*="btn"], [role="button"], input[type="submit"], input[type="button"]"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub headings: Vec<String>,
    pub paragraphs: Vec<String>,
    pub button_text: Vec<String>,
    pub list_items: Vec<String>,
}

/// Text samples plus the names of the lists that hit their cap
pub(crate) fn scan_text(document: &Html) -> (TextContent, Vec<&'static str>) {
    let mut truncated = Vec::new();

    let (headings, cut) = collect(
        select_all(document, "h1, h2, h3, h4, h5, h6").into_iter().map(element_text),
        MAX_HEADINGS,
    );
    if cut {
        truncated.push("textContent.headings");
    }

    let (paragraphs, cut) = collect(
        select_all(document, "p")
            .into_iter()
            .map(element_text)
            .filter(|text| (PARAGRAPH_MIN_CHARS..=PARAGRAPH_MAX_CHARS).contains(&text.chars().count())),
        MAX_PARAGRAPHS,
    );
    if cut {
        truncated.push("textContent.paragraphs");
    }

    let (button_text, cut) = collect(
        select_all(document, BUTTON_SELECTOR).into_iter().map(button_label),
        MAX_BUTTONS,
    );
    if cut {
        truncated.push("textContent.buttonText");
    }

    let (list_items, cut) = collect(
        select_all(document, "li")
            .into_iter()
            .filter(|li| !inside_navigation(*li))
            .map(element_text),
        MAX_LIST_ITEMS,
    );
    if cut {
        truncated.push("textContent.listItems");
    }

    let content = TextContent {
        headings,
        paragraphs,
        button_text,
        list_items,
    };
    (content, truncated)
}

fn button_label(el: ElementRef<'_>) -> String {
    if el.value().name() == "input" {
        collapse_whitespace(el.value().attr("value").unwrap_or(""))
    } else {
        element_text(el)
    }
}

fn inside_navigation(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "nav" || a.value().attr("role") == Some("navigation"))
}

/// First `cap` distinct non-empty strings, and whether more followed
fn collect(texts: impl Iterator<Item = String>, cap: usize) -> (Vec<String>, bool) {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for text in texts {
        if text.is_empty() || !seen.insert(text.clone()) {
            continue;
        }
        if out.len() == cap {
            return (out, true);
        }
        out.push(text);
    }
    (out, false)
}
