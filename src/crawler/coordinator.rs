//! Multi-page import coordination
//!
//! Imports a list of pages through the full pipeline and merges what they
//! share. Pages are imported `concurrency` at a time (one by default) with a
//! pause before each, and results are merged in input order.

use crate::config::CrawlConfig;
use crate::crawler::pages::{detect_internal_pages, suggested_filename};
use crate::diagnostics::{Issue, IssueKind};
use crate::extract::FrameworkTag;
use crate::html::{element_text, select_all};
use crate::pipeline::{ImportResult, Importer};
use crate::url::{dedup_urls, page_key};
use crate::{MirrorError, Result};
use futures::stream::{self, StreamExt};
use scraper::Html;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;
use url::Url;

/// One successfully imported page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedPage {
    pub filename: String,
    pub html: String,
    pub title: String,
    pub url: String,
}

/// Merged result of importing several pages
///
/// Failed pages are listed in `errors` and missing from `pages`. Non-fatal
/// problems of imported pages are in `warnings`, prefixed with the page URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiPageImportResult {
    pub pages: Vec<ImportedPage>,
    #[serde(rename = "sharedCSS")]
    pub shared_css: Vec<String>,
    pub shared_fonts: Vec<String>,
    pub frameworks: Vec<FrameworkTag>,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

/// Accumulates page results in order
#[derive(Debug, Default)]
struct ResultMerger {
    result: MultiPageImportResult,
    filenames: HashSet<String>,
    frameworks: BTreeSet<FrameworkTag>,
}

impl ResultMerger {
    fn add(&mut self, url: &str, outcome: Result<ImportResult>) {
        let imported = match outcome {
            Ok(imported) if imported.is_success() => imported,
            Ok(failed) => {
                tracing::warn!("Page {} failed to import", url);
                self.result
                    .errors
                    .extend(failed.errors.iter().map(|e| e.in_context(url)));
                return;
            }
            Err(e) => {
                tracing::warn!("Page {} failed to import: {}", url, e);
                let issue = match &e {
                    MirrorError::Fetch(fetch) => fetch.to_issue(),
                    other => Issue::for_url(IssueKind::Structure, url, other.to_string()),
                };
                self.result.errors.push(issue.in_context(url));
                return;
            }
        };

        self.result.shared_css.extend(imported.css.iter().cloned());
        self.result.shared_fonts.extend(imported.fonts.iter().cloned());
        self.frameworks.extend(imported.frameworks.iter().copied());
        self.result.warnings.extend(
            imported
                .errors
                .iter()
                .chain(imported.warnings.iter())
                .map(|issue| issue.in_context(url)),
        );

        let filename = self.unique_filename(url);
        self.result.pages.push(ImportedPage {
            filename,
            title: page_title(&imported.html, url),
            html: imported.html,
            url: url.to_string(),
        });
    }

    /// Suggested filename, suffixed `-2`, `-3`, ... on collision
    fn unique_filename(&mut self, url: &str) -> String {
        let base = Url::parse(url)
            .map(|u| suggested_filename(&u))
            .unwrap_or_else(|_| "page.html".to_string());

        let stem = base.trim_end_matches(".html").to_string();
        let mut candidate = base;
        let mut n = 2;
        while !self.filenames.insert(candidate.clone()) {
            candidate = format!("{}-{}.html", stem, n);
            n += 1;
        }
        candidate
    }

    fn finish(mut self) -> MultiPageImportResult {
        self.result.shared_css = dedup_urls(self.result.shared_css);
        self.result.shared_fonts = dedup_urls(self.result.shared_fonts);
        self.result.frameworks = self.frameworks.into_iter().collect();
        self.result
    }
}

/// Drives multi-page imports with one [`Importer`]
pub struct Coordinator<'a> {
    importer: &'a Importer,
    config: CrawlConfig,
}

impl<'a> Coordinator<'a> {
    pub fn new(importer: &'a Importer, config: CrawlConfig) -> Self {
        Self { importer, config }
    }

    /// Imports every URL through the full pipeline
    ///
    /// A failing page never aborts the batch; it is recorded in `errors`.
    pub async fn import_multiple_pages(&self, urls: &[String]) -> MultiPageImportResult {
        let mut merger = ResultMerger::default();
        self.import_into(&mut merger, urls, false).await;
        merger.finish()
    }

    /// Imports `url` and up to `max-pages - 1` internal pages linked from it
    ///
    /// The root page is fetched once and imported from that response. If it
    /// cannot be fetched the result has no pages and one error.
    pub async fn crawl_site(&self, url: &str) -> Result<MultiPageImportResult> {
        tracing::info!("Crawling {} (max {} pages)", url, self.config.max_pages);
        let mut merger = ResultMerger::default();

        let root = match self.importer.fetch_page(url).await {
            Ok(root) => root,
            Err(e) => {
                tracing::error!("Failed to fetch {}: {}", url, e);
                merger.result.errors.push(e.to_issue());
                return Ok(merger.finish());
            }
        };

        let source = Url::parse(&root.final_url)?;
        let html = root.text();
        let root_key = page_key(&source);

        let others: Vec<String> = detect_internal_pages(&html, &source)
            .into_iter()
            .filter(|page| {
                Url::parse(&page.url)
                    .map(|u| page_key(&u) != root_key)
                    .unwrap_or(false)
            })
            .map(|page| page.url)
            .take(self.config.max_pages.saturating_sub(1))
            .collect();
        tracing::info!("Found {} internal pages to import", others.len());

        let options = self.importer.options().with_source_url(source.as_str());
        let root_result = self.importer.import_html(&html, &options).await;
        merger.add(source.as_str(), root_result);

        self.import_into(&mut merger, &others, true).await;
        Ok(merger.finish())
    }

    /// Imports `urls`, pausing before every page after the first request
    async fn import_into(&self, merger: &mut ResultMerger, urls: &[String], delay_first: bool) {
        let delay = Duration::from_millis(self.config.delay_between_pages);
        let concurrency = self.config.concurrency.max(1);
        let importer = self.importer;

        let mut outcomes = stream::iter(urls.iter().enumerate())
            .map(|(index, url)| async move {
                if !delay.is_zero() && (index > 0 || delay_first) {
                    tokio::time::sleep(delay).await;
                }
                tracing::debug!("Importing page {}", url);
                (url, importer.import_url(url).await)
            })
            .buffered(concurrency);

        while let Some((url, outcome)) = outcomes.next().await {
            merger.add(url, outcome);
        }
    }
}

/// `<title>` of an imported page, or its URL
fn page_title(html: &str, url: &str) -> String {
    let document = Html::parse_document(html);
    select_all(&document, "title")
        .into_iter()
        .map(element_text)
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| url.to_string())
}
