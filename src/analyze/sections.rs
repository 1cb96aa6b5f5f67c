//! Navigation links and page section segmentation

use crate::html::{element_text, select_all, select_in};
use crate::url::{is_passthrough, resolve_with, BaseUrl};
use scraper::{ElementRef, Html};
use serde::Serialize;
use std::collections::HashSet;

/// Maximum number of navigation links reported
pub const MAX_NAV_LINKS: usize = 10;

/// Maximum number of sections reported
pub const MAX_SECTIONS: usize = 15;

const SECTION_CANDIDATES: &str =
    r#"section, [class~="section"], [class*="hero"], [id*="hero"], [class*="banner"]"#;

const ITEM_SELECTOR: &str = r#"li, article, [class*="card"], [class*="item"]"#;

/// One navigation anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub text: String,
    pub href: String,
}

/// Section category inferred from class/id keywords, then its heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Hero,
    Features,
    About,
    Testimonials,
    Team,
    Pricing,
    Cta,
    Faq,
    Gallery,
    Stats,
    Content,
}

/// Keyword table, checked in order; the first hit wins
const SECTION_KEYWORDS: &[(SectionType, &[&str])] = &[
    (SectionType::Hero, &["hero", "banner", "jumbotron", "masthead", "splash"]),
    (SectionType::Testimonials, &["testimonial", "review", "quote"]),
    (SectionType::Pricing, &["pricing", "price", "plans"]),
    (SectionType::Faq, &["faq", "question"]),
    (SectionType::Team, &["team", "staff", "people"]),
    (SectionType::Gallery, &["gallery", "portfolio", "showcase"]),
    (SectionType::Stats, &["stats", "statistic", "numbers", "counter", "metrics"]),
    (SectionType::Features, &["feature", "services", "benefit"]),
    (SectionType::About, &["about", "story", "mission"]),
    (SectionType::Cta, &["cta", "call-to-action", "signup", "subscribe", "get-started"]),
];

/// One top-level content section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInfo {
    #[serde(rename = "type")]
    pub kind: SectionType,
    pub class_or_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub item_count: usize,
    pub has_background: bool,
}

/// Anchors of the first navigation block, falling back to header anchors
pub(crate) fn scan_navigation(document: &Html, base: Option<&BaseUrl>) -> (Vec<NavLink>, bool) {
    let container = select_all(document, r#"nav, [role="navigation"]"#)
        .into_iter()
        .next()
        .or_else(|| select_all(document, "header").into_iter().next());

    let container = match container {
        Some(container) => container,
        None => return (Vec::new(), false),
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in select_in(container, "a[href]") {
        let text = element_text(anchor);
        let href = anchor.value().attr("href").unwrap_or("").trim();
        if text.is_empty() || href.is_empty() {
            continue;
        }

        let href = if href.starts_with('#') || is_passthrough(href) {
            href.to_string()
        } else {
            resolve_with(base, href)
        };

        if seen.insert((text.clone(), href.clone())) {
            if links.len() == MAX_NAV_LINKS {
                return (links, true);
            }
            links.push(NavLink { text, href });
        }
    }

    (links, false)
}

/// Segments the page into typed sections
///
/// Candidates nested inside another candidate are skipped, so a hero wrapper
/// holding a `.section-title` counts once.
pub(crate) fn scan_sections(document: &Html) -> (Vec<SectionInfo>, bool) {
    let candidates = select_all(document, SECTION_CANDIDATES);
    let ids: HashSet<_> = candidates.iter().map(|el| el.id()).collect();

    let mut sections = Vec::new();
    for el in candidates.iter().copied() {
        let nested = el
            .ancestors()
            .any(|ancestor| ids.contains(&ancestor.id()));
        if nested {
            continue;
        }

        if sections.len() == MAX_SECTIONS {
            return (sections, true);
        }
        sections.push(describe_section(el));
    }

    (sections, false)
}

fn describe_section(el: ElementRef<'_>) -> SectionInfo {
    let attrs = el.value();
    let class_or_id = attrs
        .id()
        .map(|id| format!("#{}", id))
        .or_else(|| attrs.attr("class").map(|c| c.trim().to_string()))
        .unwrap_or_default();

    let heading = select_in(el, "h1, h2, h3")
        .into_iter()
        .map(element_text)
        .find(|text| !text.is_empty());

    let markers = format!(
        "{} {}",
        attrs.attr("class").unwrap_or(""),
        attrs.id().unwrap_or("")
    )
    .to_ascii_lowercase();

    let kind = keyword_type(&markers)
        .or_else(|| heading.as_deref().and_then(|h| keyword_type(&h.to_ascii_lowercase())))
        .unwrap_or(SectionType::Content);

    let has_background = attrs
        .attr("style")
        .is_some_and(|style| style.to_ascii_lowercase().contains("background"))
        || markers.split_whitespace().any(|c| c.starts_with("bg-"));

    SectionInfo {
        kind,
        class_or_id,
        heading,
        item_count: select_in(el, ITEM_SELECTOR).len(),
        has_background,
    }
}

fn keyword_type(text: &str) -> Option<SectionType> {
    SECTION_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(kind, _)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_from_first_nav() {
        let base = BaseUrl::parse("https://example.com/").unwrap();
        let doc = Html::parse_document(
            r##"<header><a href="/">Logo</a><nav><a href="/about">About</a><a href="#top">Top</a>
               <a href="/x"><img src="i.png"></a><a href="mailto:a@b.c">Mail</a></nav></header>
               <nav><a href="/other">Other</a></nav>"##,
        );
        let (links, overflow) = scan_navigation(&doc, Some(&base));
        assert!(!overflow);
        assert_eq!(
            links,
            vec![
                NavLink { text: "About".into(), href: "https://example.com/about".into() },
                NavLink { text: "Top".into(), href: "#top".into() },
                NavLink { text: "Mail".into(), href: "mailto:a@b.c".into() },
            ]
        );
    }

    #[test]
    fn test_navigation_header_fallback_and_cap() {
        let anchors: String = (0..12).map(|i| format!("<a href=\"/p{}\">Page {}</a>", i, i)).collect();
        let doc = Html::parse_document(&format!("<header>{}</header>", anchors));
        let (links, overflow) = scan_navigation(&doc, None);
        assert_eq!(links.len(), MAX_NAV_LINKS);
        assert_eq!(links[0].href, "/p0");
        assert!(overflow);
    }

    #[test]
    fn test_section_typing() {
        let doc = Html::parse_document(
            r#"<div class="hero-banner" style="background:#000"><h1>Welcome</h1><div class="section">nested</div></div>
               <section id="features"><h2>What we do</h2><div class="card"></div><div class="card"></div></section>
               <section class="block"><h2>Frequently asked questions</h2><ul><li>a</li><li>b</li></ul></section>
               <section class="bg-light"><p>plain</p></section>"#,
        );
        let (sections, overflow) = scan_sections(&doc);
        assert!(!overflow);

        let kinds: Vec<SectionType> = sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SectionType::Hero, SectionType::Features, SectionType::Faq, SectionType::Content]
        );
        assert!(sections[0].has_background);
        assert_eq!(sections[0].heading.as_deref(), Some("Welcome"));
        assert_eq!(sections[1].class_or_id, "#features");
        assert_eq!(sections[1].item_count, 2);
        assert_eq!(sections[2].item_count, 2);
        assert!(sections[3].has_background);
        assert_eq!(sections[3].heading, None);
    }

    #[test]
    fn test_sections_capped() {
        let html: String = (0..20).map(|i| format!("<section id=\"s{}\"></section>", i)).collect();
        let (sections, overflow) = scan_sections(&Html::parse_document(&html));
        assert_eq!(sections.len(), MAX_SECTIONS);
        assert!(overflow);
    }

    #[test]
    fn test_serialized_type_field() {
        let doc = Html::parse_document(r#"<section class="pricing"></section>"#);
        let json = serde_json::to_value(&scan_sections(&doc).0[0]).unwrap();
        assert_eq!(json["type"], "pricing");
        assert_eq!(json["classOrId"], "pricing");
        assert_eq!(json["itemCount"], 0);
    }
}
