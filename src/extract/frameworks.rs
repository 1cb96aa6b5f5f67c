//! CSS framework detection
//!
//! Best-effort: a framework is reported when one of its filename or class
//! signatures appears in the markup or in a stylesheet URL. Bootstrap and
//! Tailwind are also inferred from utility-class density when no signature
//! matched. False positives and negatives are expected.

use crate::html::select_all;
use scraper::Html;
use serde::Serialize;
use std::fmt;

/// A recognized framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkTag {
    Bootstrap,
    Tailwind,
    Bulma,
    Foundation,
    Materialize,
    Fontawesome,
    Animate,
}

impl FrameworkTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::Tailwind => "tailwind",
            Self::Bulma => "bulma",
            Self::Foundation => "foundation",
            Self::Materialize => "materialize",
            Self::Fontawesome => "fontawesome",
            Self::Animate => "animate",
        }
    }
}

impl fmt::Display for FrameworkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows and columns needed before Bootstrap is inferred from class names
const BOOTSTRAP_MIN_ROWS: usize = 2;
const BOOTSTRAP_MIN_COLS: usize = 3;

/// Utility classes needed before Tailwind is inferred from class names
const TAILWIND_MIN_UTILITIES: usize = 10;

const TAILWIND_PREFIXES: &[&str] = &[
    "text-", "bg-", "p-", "px-", "py-", "pt-", "pb-", "m-", "mx-", "my-", "mt-", "mb-", "w-",
    "h-", "gap-", "space-", "rounded", "shadow", "items-", "justify-", "grid-cols-", "max-w-",
];

/// Signature-driven detector
///
/// The default signatures cover the seven known tags; tests and callers may
/// supply their own.
#[derive(Debug, Clone)]
pub struct FrameworkDetector {
    signatures: Vec<(FrameworkTag, Vec<String>)>,
}

impl Default for FrameworkDetector {
    fn default() -> Self {
        let table: &[(FrameworkTag, &[&str])] = &[
            (
                FrameworkTag::Bootstrap,
                &["bootstrap.min.css", "bootstrap.css", "bootstrap.bundle", "bootstrap.min.js", "bootstrap@", "/bootstrap/"],
            ),
            (
                FrameworkTag::Tailwind,
                &["tailwindcss", "tailwind.min.css", "tailwind.css"],
            ),
            (FrameworkTag::Bulma, &["bulma.min.css", "bulma.css", "bulma@"]),
            (
                FrameworkTag::Foundation,
                &["foundation.min.css", "foundation.css", "foundation-sites"],
            ),
            (
                FrameworkTag::Materialize,
                &["materialize.min.css", "materialize.css", "materializecss"],
            ),
            (
                FrameworkTag::Fontawesome,
                &["font-awesome", "fontawesome", "fa-solid", "fa-regular", "fa-brands"],
            ),
            (
                FrameworkTag::Animate,
                &["animate.min.css", "animate.css", "animate__animated"],
            ),
        ];

        Self::new(
            table
                .iter()
                .map(|(tag, sigs)| (*tag, sigs.iter().map(|s| s.to_string()).collect()))
                .collect(),
        )
    }
}

impl FrameworkDetector {
    /// Creates a detector from `(tag, signatures)` pairs; signatures match case-insensitively
    pub fn new(signatures: Vec<(FrameworkTag, Vec<String>)>) -> Self {
        Self {
            signatures: signatures
                .into_iter()
                .map(|(tag, sigs)| (tag, sigs.into_iter().map(|s| s.to_ascii_lowercase()).collect()))
                .collect(),
        }
    }

    /// Detects frameworks in `html` and the given stylesheet URLs
    ///
    /// The result is sorted and contains each tag at most once.
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_mirror::extract::{FrameworkDetector, FrameworkTag};
    ///
    /// let detector = FrameworkDetector::default();
    /// let css = vec!["https://cdn.jsdelivr.net/npm/bulma@0.9.4/css/bulma.min.css".to_string()];
    /// assert_eq!(detector.detect("<div></div>", &css), vec![FrameworkTag::Bulma]);
    /// ```
    pub fn detect(&self, html: &str, css_urls: &[String]) -> Vec<FrameworkTag> {
        let mut haystack = html.to_ascii_lowercase();
        for url in css_urls {
            haystack.push('\n');
            haystack.push_str(&url.to_ascii_lowercase());
        }

        let mut found: Vec<FrameworkTag> = self
            .signatures
            .iter()
            .filter(|(_, sigs)| sigs.iter().any(|s| haystack.contains(s.as_str())))
            .map(|(tag, _)| *tag)
            .collect();

        if !found.contains(&FrameworkTag::Bootstrap) && !found.contains(&FrameworkTag::Tailwind) {
            let density = ClassDensity::measure(html);
            if density.looks_like_bootstrap() {
                tracing::debug!("Inferred bootstrap from grid classes");
                found.push(FrameworkTag::Bootstrap);
            } else if density.looks_like_tailwind() {
                tracing::debug!("Inferred tailwind from utility classes");
                found.push(FrameworkTag::Tailwind);
            }
        }

        found.sort();
        found.dedup();
        found
    }
}

#[derive(Debug, Default)]
struct ClassDensity {
    containers: usize,
    rows: usize,
    cols: usize,
    utilities: usize,
    color_utilities: usize,
}

impl ClassDensity {
    fn measure(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut density = Self::default();

        for el in select_all(&document, "[class]") {
            for class in el.value().classes() {
                match class {
                    "container" | "container-fluid" => density.containers += 1,
                    "row" => density.rows += 1,
                    c if c.starts_with("col-") || c == "col" => density.cols += 1,
                    c if c == "flex" || c == "grid" || has_tailwind_prefix(c) => {
                        density.utilities += 1;
                        if c.starts_with("text-") || c.starts_with("bg-") {
                            density.color_utilities += 1;
                        }
                    }
                    _ => {}
                }
            }
        }

        density
    }

    fn looks_like_bootstrap(&self) -> bool {
        self.rows >= BOOTSTRAP_MIN_ROWS && self.cols >= BOOTSTRAP_MIN_COLS
    }

    fn looks_like_tailwind(&self) -> bool {
        self.utilities >= TAILWIND_MIN_UTILITIES && self.color_utilities > 0
    }
}

fn has_tailwind_prefix(class: &str) -> bool {
    // Responsive and state variants: `md:flex`, `hover:bg-blue-500`
    let base = class.rsplit(':').next().unwrap_or(class);
    base == "flex"
        || base == "grid"
        || TAILWIND_PREFIXES.iter().any(|p| base.starts_with(p))
}
