//! Content analysis
//!
//! Read-only, deterministic extraction of design facts from a page. Every list
//! is deduplicated and capped first-N in document order; any cap that cut
//! something is named in [`WebsiteAnalysis::truncated`].

mod colors;
mod fonts;
mod images;
mod layout;
mod sections;
mod text;

pub use colors::{extract_colors, MAX_COLORS};
pub use fonts::{extract_fonts, google_font_families, MAX_FONTS};
pub use images::{ImageContext, ImageInfo, MAX_IMAGES};
pub use layout::{GridSystem, LayoutInfo, LayoutType};
pub use sections::{NavLink, SectionInfo, SectionType, MAX_NAV_LINKS, MAX_SECTIONS};
pub use text::TextContent;

use crate::diagnostics::{Diagnostics, Issue, IssueKind};
use crate::html::select_all;
use crate::inline::existing_inlined_css;
use crate::url::BaseUrl;
use scraper::Html;
use serde::Serialize;

/// Maximum size of [`WebsiteAnalysis::html`] in bytes
pub const MAX_HTML_BYTES: usize = 100 * 1024;

/// Maximum size of [`CssSummary::inlined`] in bytes
pub const MAX_CSS_BYTES: usize = 50 * 1024;

pub const HTML_TRUNCATION_MARKER: &str = "<!-- sumi-mirror: truncated -->";
pub const CSS_TRUNCATION_MARKER: &str = "/* sumi-mirror: truncated */";

/// Stylesheet text and references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CssSummary {
    pub inlined: String,
    pub external: Vec<String>,
}

/// Everything the analyzer learned about one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteAnalysis {
    pub html: String,
    pub title: String,
    pub description: String,
    pub colors: Vec<String>,
    pub fonts: Vec<String>,
    pub images: Vec<ImageInfo>,
    pub css: CssSummary,
    pub layout: LayoutInfo,
    pub navigation: Vec<NavLink>,
    pub sections: Vec<SectionInfo>,
    pub text_content: TextContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Capped fields that had more entries than they report
    pub truncated: Vec<String>,
    pub warnings: Vec<Issue>,
}

/// Inputs gathered by the import pipeline for one page
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisInput<'a> {
    /// Normalized page HTML
    pub html: &'a str,
    /// Aggregated inlined stylesheet text; read from the page when empty
    pub inlined_css: &'a str,
    /// Stylesheets left as external references
    pub external_css: &'a [String],
    /// Google Fonts and other font stylesheet URLs
    pub font_urls: &'a [String],
    pub source: Option<&'a BaseUrl>,
}

/// Analyzes a normalized page
///
/// # Examples
///
/// ```
/// use sumi_mirror::analyze::{analyze_website, AnalysisInput};
///
/// let html = "<html><head><title>Acme</title><style>body{color:#333}</style></head>\
///             <body><nav><a href=\"/about\">About</a></nav></body></html>";
/// let analysis = analyze_website(AnalysisInput { html, ..Default::default() });
/// assert_eq!(analysis.title, "Acme");
/// assert_eq!(analysis.colors, vec!["#333333"]);
/// assert_eq!(analysis.navigation[0].href, "/about");
/// ```
pub fn analyze_website(input: AnalysisInput<'_>) -> WebsiteAnalysis {
    let document = Html::parse_document(input.html);
    let mut diag = Diagnostics::new();
    let mut truncated: Vec<String> = Vec::new();

    let inlined_css = if input.inlined_css.is_empty() {
        existing_inlined_css(input.html)
    } else {
        input.inlined_css.to_string()
    };
    let css_text = gather_css(&document, &inlined_css);

    let (colors, cut) = colors::scan_colors(&css_text);
    if cut {
        truncated.push("colors".into());
    }

    let (fonts, cut) = fonts::scan_fonts(input.font_urls, &css_text);
    if cut {
        truncated.push("fonts".into());
    }

    let (images, cut) = images::scan_images(&document, input.source);
    if cut {
        truncated.push("images".into());
    }

    let (navigation, cut) = sections::scan_navigation(&document, input.source);
    if cut {
        truncated.push("navigation".into());
    }

    let (sections, cut) = sections::scan_sections(&document);
    if cut {
        truncated.push("sections".into());
    }

    let (text_content, cut_text) = text::scan_text(&document);
    truncated.extend(cut_text.into_iter().map(String::from));

    let layout = layout::detect_layout(&document, &css_text, sections.len());

    let title = page_title(&document);
    if title.is_empty() {
        diag.warn(Issue::new(IssueKind::ParseAmbiguity, "No title, og:title or h1 found"));
    }
    if navigation.is_empty() && sections.is_empty() {
        diag.warn(Issue::new(
            IssueKind::ParseAmbiguity,
            "No navigation block or content sections found",
        ));
    }

    let (html, cut) = cap_text(input.html, MAX_HTML_BYTES, HTML_TRUNCATION_MARKER);
    if cut {
        truncated.push("html".into());
    }
    let (inlined, cut) = cap_text(&inlined_css, MAX_CSS_BYTES, CSS_TRUNCATION_MARKER);
    if cut {
        truncated.push("css".into());
    }

    if !truncated.is_empty() {
        diag.warn(Issue::new(
            IssueKind::SizeLimitExceeded,
            format!("Truncated {}", truncated.join(", ")),
        ));
    }

    tracing::debug!(
        "Analyzed page: {} colors, {} fonts, {} images, {} sections",
        colors.len(),
        fonts.len(),
        images.len(),
        sections.len()
    );

    WebsiteAnalysis {
        html,
        title,
        description: page_description(&document),
        colors,
        fonts,
        images,
        css: CssSummary {
            inlined,
            external: input.external_css.to_vec(),
        },
        layout,
        navigation,
        sections,
        text_content,
        source_url: input.source.map(|s| s.as_str().to_string()),
        truncated,
        warnings: diag.warnings,
    }
}

/// `<style>` blocks, `style` attributes and the inlined stylesheet text
fn gather_css(document: &Html, inlined_css: &str) -> String {
    let mut css = String::new();
    for style in select_all(document, "style") {
        if style.value().attr("data-inlined") == Some("true") {
            continue;
        }
        css.extend(style.text());
        css.push('\n');
    }
    for el in select_all(document, "[style]") {
        if let Some(style) = el.value().attr("style") {
            css.push_str(style);
            css.push_str(";\n");
        }
    }
    css.push_str(inlined_css);
    css
}

fn page_title(document: &Html) -> String {
    let from_title = select_all(document, "title")
        .into_iter()
        .map(crate::html::element_text)
        .find(|t| !t.is_empty());

    from_title
        .or_else(|| meta_content(document, r#"meta[property="og:title"]"#))
        .or_else(|| {
            select_all(document, "h1")
                .into_iter()
                .map(crate::html::element_text)
                .find(|t| !t.is_empty())
        })
        .unwrap_or_default()
}

fn page_description(document: &Html) -> String {
    meta_content(document, r#"meta[name="description"]"#)
        .or_else(|| meta_content(document, r#"meta[property="og:description"]"#))
        .unwrap_or_default()
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    select_all(document, selector)
        .into_iter()
        .filter_map(|el| el.value().attr("content"))
        .map(crate::html::collapse_whitespace)
        .find(|c| !c.is_empty())
}

/// Cuts `text` to at most `max` bytes on a char boundary and appends `marker`
fn cap_text(text: &str, max: usize, marker: &str) -> (String, bool) {
    if text.len() <= max {
        return (text.to_string(), false);
    }
    let mut end = max.saturating_sub(marker.len() + 1);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (format!("{}\n{}", &text[..end], marker), true)
}
