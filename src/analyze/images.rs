//! Image inventory with placement context

use crate::html::select_all;
use crate::url::{canonical_key, is_passthrough, resolve_with, BaseUrl};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::Serialize;
use std::collections::HashSet;

/// Maximum number of images reported
pub const MAX_IMAGES: usize = 30;

static STYLE_BACKGROUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"background(?:-image)?\s*:[^;]*?url\(\s*['"]?([^'")]+?)['"]?\s*\)"#)
        .expect("BUG: hardcoded background url regex is invalid")
});

/// Where an image sits on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageContext {
    Logo,
    Hero,
    Gallery,
    Background,
    Content,
}

/// One image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub url: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub context: ImageContext,
}

/// Collects `<img>` and inline-style background images in document order
pub(crate) fn scan_images(document: &Html, base: Option<&BaseUrl>) -> (Vec<ImageInfo>, bool) {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    // `img, [style]` keeps document order across both kinds
    for el in select_all(document, "img, [style]") {
        let info = if el.value().name() == "img" {
            image_from_img(el, base)
        } else {
            background_from_style(el, base)
        };

        if let Some(info) = info {
            if seen.insert(canonical_key(&info.url)) {
                if images.len() == MAX_IMAGES {
                    return (images, true);
                }
                images.push(info);
            }
        }
    }

    (images, false)
}

fn image_from_img(el: ElementRef<'_>, base: Option<&BaseUrl>) -> Option<ImageInfo> {
    let attrs = el.value();
    let src = attrs
        .attr("src")
        .or_else(|| attrs.attr("data-src"))
        .map(str::trim)
        .filter(|s| !s.is_empty() && !is_passthrough(s))?;

    Some(ImageInfo {
        url: resolve_with(base, src),
        alt: attrs.attr("alt").unwrap_or("").trim().to_string(),
        width: attrs.attr("width").and_then(parse_dimension),
        height: attrs.attr("height").and_then(parse_dimension),
        context: image_context(el),
    })
}

fn background_from_style(el: ElementRef<'_>, base: Option<&BaseUrl>) -> Option<ImageInfo> {
    let style = el.value().attr("style")?;
    let url = STYLE_BACKGROUND.captures(style)?.get(1)?.as_str().trim();
    if url.is_empty() || is_passthrough(url) {
        return None;
    }

    let context = match image_context(el) {
        ImageContext::Hero => ImageContext::Hero,
        _ => ImageContext::Background,
    };

    Some(ImageInfo {
        url: resolve_with(base, url),
        alt: String::new(),
        width: None,
        height: None,
        context,
    })
}

/// `300`, `300px` → 300; percentages and garbage → None
fn parse_dimension(value: &str) -> Option<u32> {
    value.trim().trim_end_matches("px").trim().parse().ok()
}

/// Classifies by markers on the element itself, then on its ancestors
fn image_context(el: ElementRef<'_>) -> ImageContext {
    let own = markers(el);
    if own.contains("logo") {
        return ImageContext::Logo;
    }

    for ancestor in el.ancestors().filter_map(ElementRef::wrap) {
        let name = ancestor.value().name();
        let marks = markers(ancestor);

        if marks.contains("logo") || (name == "a" && marks.contains("brand")) {
            return ImageContext::Logo;
        }
        if ["hero", "banner", "jumbotron", "masthead"]
            .iter()
            .any(|k| marks.contains(k))
        {
            return ImageContext::Hero;
        }
        if ["gallery", "portfolio", "carousel", "slider"]
            .iter()
            .any(|k| marks.contains(k))
        {
            return ImageContext::Gallery;
        }
        if name == "header" || name == "nav" {
            // Small images in the page header are almost always the brand mark
            return ImageContext::Logo;
        }
    }

    if ["hero", "banner"].iter().any(|k| own.contains(k)) {
        ImageContext::Hero
    } else {
        ImageContext::Content
    }
}

/// Lowercased class, id, alt and src of an element, space separated
fn markers(el: ElementRef<'_>) -> String {
    let attrs = el.value();
    [attrs.attr("class"), attrs.attr("id"), attrs.attr("alt"), attrs.attr("src")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}
