//! Page layout flags

use crate::html::select_all;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde::Serialize;

static DISPLAY_GRID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)display\s*:\s*(?:inline-)?grid").expect("BUG: hardcoded display grid regex is invalid")
});

static DISPLAY_FLEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)display\s*:\s*(?:inline-)?flex").expect("BUG: hardcoded display flex regex is invalid")
});

static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)float\s*:\s*(?:left|right)").expect("BUG: hardcoded float regex is invalid")
});

static STICKY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)position\s*:\s*(?:sticky|fixed)").expect("BUG: hardcoded position regex is invalid")
});

static CONTAINER_WIDTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.container\b[^{]*\{[^}]*?max-width\s*:\s*([^;}]+)")
        .expect("BUG: hardcoded container width regex is invalid")
});

/// Dominant layout technique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GridSystem {
    CssGrid,
    Bootstrap,
    Flexbox,
    Float,
    None,
}

/// Overall page shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutType {
    Landing,
    Blog,
    Sidebar,
    MultiSection,
    SingleColumn,
}

/// Presence flags and layout classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInfo {
    pub has_navigation: bool,
    pub has_header: bool,
    pub has_footer: bool,
    pub has_sidebar: bool,
    pub has_hero: bool,
    pub grid_system: GridSystem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_width: Option<String>,
    pub is_responsive: bool,
    pub has_sticky_nav: bool,
    pub layout_type: LayoutType,
}

/// Derives layout flags from the parsed document and its CSS
///
/// `section_count` is the number of top-level content sections found by the
/// section scanner; it separates landing pages from single-column ones.
pub(crate) fn detect_layout(document: &Html, css: &str, section_count: usize) -> LayoutInfo {
    let any = |selector: &str| !select_all(document, selector).is_empty();
    let classes = ClassIndex::build(document);

    let has_navigation = any("nav") || any(r#"[role="navigation"]"#);
    let has_header = any("header") || any(r#"[role="banner"]"#) || classes.has_marker("header");
    let has_footer = any("footer") || any(r#"[role="contentinfo"]"#) || classes.has_marker("footer");
    let has_sidebar = any("aside") || classes.has_marker("sidebar");
    let has_hero = ["hero", "jumbotron", "masthead", "banner"]
        .iter()
        .any(|m| classes.has_marker(m));

    let grid_system = if classes.count_exact("row") > 0 && classes.count_prefix("col-") > 0 {
        GridSystem::Bootstrap
    } else if DISPLAY_GRID.is_match(css) || classes.count_exact("grid") > 0 {
        GridSystem::CssGrid
    } else if DISPLAY_FLEX.is_match(css) || classes.count_exact("flex") > 0 || classes.count_exact("d-flex") > 0 {
        GridSystem::Flexbox
    } else if FLOAT.is_match(css) {
        GridSystem::Float
    } else {
        GridSystem::None
    };

    let container_width = CONTAINER_WIDTH
        .captures(css)
        .map(|cap| cap[1].trim().to_string());

    let is_responsive = any(r#"meta[name="viewport"]"#) || css.contains("@media");

    let has_sticky_nav = STICKY.is_match(css)
        || ["sticky", "sticky-top", "fixed-top", "navbar-fixed-top"]
            .iter()
            .any(|c| classes.count_exact(c) > 0)
        || select_all(document, "nav, header")
            .into_iter()
            .filter_map(|el| el.value().attr("style"))
            .any(|style| STICKY.is_match(style));

    let article_count = select_all(document, "article").len();
    let blog_marked = ["post", "blog", "entry"].iter().any(|m| classes.has_marker(m));

    let layout_type = if article_count >= 2 || (article_count >= 1 && blog_marked) {
        LayoutType::Blog
    } else if has_sidebar {
        LayoutType::Sidebar
    } else if has_hero && section_count >= 3 {
        LayoutType::Landing
    } else if section_count >= 3 {
        LayoutType::MultiSection
    } else {
        LayoutType::SingleColumn
    };

    LayoutInfo {
        has_navigation,
        has_header,
        has_footer,
        has_sidebar,
        has_hero,
        grid_system,
        container_width,
        is_responsive,
        has_sticky_nav,
        layout_type,
    }
}

/// Every class token and id in the document, lowercased
struct ClassIndex {
    tokens: Vec<String>,
}

impl ClassIndex {
    fn build(document: &Html) -> Self {
        let mut tokens = Vec::new();
        for el in select_all(document, "[class], [id]") {
            tokens.extend(el.value().classes().map(|c| c.to_ascii_lowercase()));
            if let Some(id) = el.value().id() {
                tokens.push(id.to_ascii_lowercase());
            }
        }
        Self { tokens }
    }

    fn count_exact(&self, token: &str) -> usize {
        self.tokens.iter().filter(|t| t.as_str() == token).count()
    }

    fn count_prefix(&self, prefix: &str) -> usize {
        self.tokens.iter().filter(|t| t.starts_with(prefix)).count()
    }

    /// Token equal to `marker` or made of it plus a `-`/`_` separated part
    fn has_marker(&self, marker: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| t.split(['-', '_']).any(|part| part == marker))
    }
}
