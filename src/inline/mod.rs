//! Stylesheet and image inlining
//!
//! Fetchable stylesheets are downloaded in batches, their internal references
//! made absolute, and the results embedded in a single
//! `<style data-inlined="true">` block. The `<link>` tags that were inlined are
//! removed. Running the inliner over its own output changes nothing.

mod css;
mod images;

pub use css::{escape_style_text, rewrite_css_urls};
pub use images::inline_images;

use crate::diagnostics::{Diagnostics, Issue, IssueKind};
use crate::fetch::{fetch_batched, Fetcher, ResourceKind};
use crate::html::{insert_before_head_end, rewrite, select_all};
use crate::policy::{DomainPolicy, ResourceClass};
use crate::url::{canonical_key, resolve_with, BaseUrl};
use crate::MirrorError;
use lol_html::html_content::ContentType;
use lol_html::{element, Settings};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::cell::Cell;
use std::collections::HashSet;
use std::time::Duration;

/// Selector of the block this module owns
pub const INLINED_STYLE_SELECTOR: &str = r#"style[data-inlined="true"]"#;

static PROVENANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/\* Inlined from: (\S+) \*/").expect("BUG: hardcoded provenance regex is invalid")
});

/// Output of one inlining pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineOutcome {
    /// Document with the inlined block and without the inlined links
    pub html: String,
    /// Full content of the inlined block after this pass
    pub css: String,
    /// Stylesheet URLs embedded by this pass, in input order
    pub inlined: Vec<String>,
}

/// Fetches and embeds linked stylesheets
#[derive(Debug, Clone)]
pub struct Inliner<'a> {
    fetcher: &'a Fetcher,
    policy: &'a DomainPolicy,
    timeout: Duration,
    batch_size: usize,
}

impl<'a> Inliner<'a> {
    pub fn new(
        fetcher: &'a Fetcher,
        policy: &'a DomainPolicy,
        timeout: Duration,
        batch_size: usize,
    ) -> Self {
        Self {
            fetcher,
            policy,
            timeout,
            batch_size,
        }
    }

    /// Inlines every fetchable stylesheet of `css_urls` into `html`
    ///
    /// # Per-URL handling
    ///
    /// - Tracking: recorded as a `Blocked` warning, never fetched
    /// - CDN: left in place as an external reference
    /// - Already inlined (provenance comment present): skipped
    /// - Fetch failure: recorded in `diag.errors`, the link stays
    pub async fn inline_stylesheets(
        &self,
        html: &str,
        css_urls: &[String],
        page_base: Option<&BaseUrl>,
        diag: &mut Diagnostics,
    ) -> Result<InlineOutcome, MirrorError> {
        let existing_css = existing_inlined_css(html);
        let already: HashSet<String> = PROVENANCE
            .captures_iter(&existing_css)
            .map(|cap| canonical_key(&cap[1]))
            .collect();

        let mut queue = Vec::new();
        for url in css_urls {
            let class = self.policy.classify(url);
            if class.should_fetch() {
                if !already.contains(&canonical_key(url)) {
                    queue.push(url.clone());
                }
                continue;
            }
            match class {
                ResourceClass::Tracking => diag.warn(Issue::for_url(
                    IssueKind::Blocked,
                    url.clone(),
                    "Tracking stylesheet skipped",
                )),
                ResourceClass::Cdn => tracing::debug!("Keeping CDN stylesheet {}", url),
                _ => tracing::debug!("Not inlining unresolved stylesheet {}", url),
            }
        }

        if queue.is_empty() {
            return Ok(InlineOutcome {
                html: html.to_string(),
                css: existing_css,
                inlined: Vec::new(),
            });
        }

        tracing::info!("Inlining {} stylesheets", queue.len());
        let outcomes =
            fetch_batched(self.fetcher, &queue, ResourceKind::Css, self.timeout, self.batch_size)
                .await;

        let mut blocks = Vec::new();
        let mut inlined = Vec::new();
        let mut failed = Vec::new();
        for (url, result) in outcomes {
            match result {
                Ok(fetched) => {
                    let text = fetched.text();
                    let rewritten = match BaseUrl::parse(&url) {
                        Ok(sheet_base) => rewrite_css_urls(&text, &sheet_base),
                        Err(_) => text,
                    };
                    blocks.push(format!(
                        "/* Inlined from: {} */\n{}",
                        url,
                        escape_style_text(rewritten.trim())
                    ));
                    inlined.push(url);
                }
                Err(e) => {
                    diag.error(e.to_issue());
                    failed.push(url);
                }
            }
        }

        if inlined.is_empty() {
            return Ok(InlineOutcome {
                html: html.to_string(),
                css: existing_css,
                inlined,
            });
        }

        let new_css = blocks.join("\n\n");
        let without_links = remove_stylesheet_links(html, &inlined, &failed, page_base)?;
        let html = append_inlined_css(&without_links, &new_css)?;

        let css = if existing_css.trim().is_empty() {
            new_css
        } else {
            format!("{}\n\n{}", existing_css.trim_end(), new_css)
        };

        Ok(InlineOutcome { html, css, inlined })
    }
}

/// Text of the first `<style data-inlined="true">` block, empty if none
pub fn existing_inlined_css(html: &str) -> String {
    let document = Html::parse_document(html);
    select_all(&document, INLINED_STYLE_SELECTOR)
        .first()
        .map(|el| el.text().collect())
        .unwrap_or_default()
}

/// Removes `<link>` tags pointing at any of `inlined`
///
/// A link matches when its resolved href has the same canonical URL, or the
/// same URL once the query string is dropped (`style.css?v=3`). Links to a
/// stylesheet whose fetch failed always stay.
fn remove_stylesheet_links(
    html: &str,
    inlined: &[String],
    failed: &[String],
    page_base: Option<&BaseUrl>,
) -> Result<String, MirrorError> {
    let keys: HashSet<String> = inlined.iter().map(|u| canonical_key(u)).collect();
    let paths: HashSet<String> = inlined.iter().map(|u| path_key(u)).collect();
    let kept: HashSet<String> = failed.iter().map(|u| canonical_key(u)).collect();

    let output = rewrite(
        html,
        Settings {
            element_content_handlers: vec![element!("link[href]", |el| {
                let rel = el.get_attribute("rel").unwrap_or_default().to_ascii_lowercase();
                if rel.contains("preload") || rel.contains("icon") {
                    return Ok(());
                }
                let href = match el.get_attribute("href") {
                    Some(h) => h,
                    None => return Ok(()),
                };

                let resolved = resolve_with(page_base, &href);
                let key = canonical_key(&resolved);
                if kept.contains(&key) {
                    return Ok(());
                }

                if keys.contains(&key) || paths.contains(&path_key(&resolved)) {
                    tracing::debug!("Removing inlined stylesheet link {}", href);
                    el.remove();
                }
                Ok(())
            })],
            ..Settings::default()
        },
    )?;
    Ok(output)
}

/// Appends `css` to the existing inlined block, or inserts a new block
fn append_inlined_css(html: &str, css: &str) -> Result<String, MirrorError> {
    if existing_block_present(html) {
        let done = Cell::new(false);
        let output = rewrite(
            html,
            Settings {
                element_content_handlers: vec![element!(INLINED_STYLE_SELECTOR, |el| {
                    if !done.get() {
                        el.append(&format!("\n\n{}\n", css), ContentType::Html);
                        done.set(true);
                    }
                    Ok(())
                })],
                ..Settings::default()
            },
        )?;
        return Ok(output);
    }

    let block = format!("<style data-inlined=\"true\">\n{}\n</style>\n", css);
    Ok(insert_before_head_end(html, &block))
}

fn existing_block_present(html: &str) -> bool {
    let document = Html::parse_document(html);
    !select_all(&document, INLINED_STYLE_SELECTOR).is_empty()
}

/// Canonical key without query string
fn path_key(url: &str) -> String {
    let key = canonical_key(url);
    match key.split_once('?') {
        Some((path, _)) => path.to_string(),
        None => key,
    }
}
