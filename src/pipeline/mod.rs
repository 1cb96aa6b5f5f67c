//! Import pipeline
//!
//! Chains the stages in their fixed order:
//!
//! 1. Text normalization
//! 2. URL absolutization (needs a source URL)
//! 3. Resource extraction
//! 4. Stylesheet inlining
//! 5. Image inlining (opt-in)
//! 6. Cleanup: broken references, trackers, conditional comments
//! 7. Restoring CDN stylesheet and font links
//! 8. CDN attribute fixes
//! 9. Document structure
//! 10. Meta tags
//! 11. Base tag (needs a source URL)
//!
//! Later stages assume earlier ones ran; in particular everything after step 2
//! sees absolute URLs. Each boolean of [`ImportOptions`] switches one stage.

use crate::analyze::{analyze_website, AnalysisInput, WebsiteAnalysis};
use crate::config::{Config, ImportOptions};
use crate::diagnostics::{Diagnostics, Issue};
use crate::extract::{extract_resources, extract_stylesheet_urls, FrameworkDetector, FrameworkTag};
use crate::fetch::{FetchError, Fetched, Fetcher, ResourceKind};
use crate::inline::{existing_inlined_css, inline_images, Inliner};
use crate::normalize::{
    absolutize_urls, add_base_tag, ensure_document_structure, ensure_meta_tags,
    ensure_stylesheets_and_fonts, fix_cdn_attributes, fix_common_issues, normalize_text,
    SanitizeOptions,
};
use crate::policy::DomainPolicy;
use crate::url::BaseUrl;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Result of importing one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub html: String,
    pub css: Vec<String>,
    pub js: Vec<String>,
    pub fonts: Vec<String>,
    pub images: Vec<String>,
    pub frameworks: Vec<FrameworkTag>,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    #[serde(rename = "inlinedCSS")]
    pub inlined_css: String,
}

impl ImportResult {
    /// Empty result carrying the reason the root page could not be loaded
    pub fn failed(error: Issue) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    /// Returns true if the page itself was imported
    pub fn is_success(&self) -> bool {
        !self.html.is_empty()
    }
}

/// Runs imports with one shared client, policy and configuration
#[derive(Debug, Clone)]
pub struct Importer {
    fetcher: Fetcher,
    policy: Arc<DomainPolicy>,
    frameworks: FrameworkDetector,
    options: ImportOptions,
    batch_size: usize,
}

impl Importer {
    /// Creates an importer from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let policy = Arc::new(DomainPolicy::from_config(&config.policy));
        let fetcher = Fetcher::new(&config.fetch, Arc::clone(&policy))?;

        Ok(Self {
            fetcher,
            policy,
            frameworks: FrameworkDetector::default(),
            options: config.import.clone(),
            batch_size: config.fetch.batch_size,
        })
    }

    /// Default options applied by [`Importer::import_url`]
    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn policy(&self) -> &DomainPolicy {
        &self.policy
    }

    /// Fetches a page as HTML with the configured timeout
    pub async fn fetch_page(&self, url: &str) -> std::result::Result<Fetched, FetchError> {
        let timeout = self.timeout(&self.options);
        self.fetcher.fetch(url, ResourceKind::Html, timeout).await
    }

    /// Fetches `url` and imports it
    ///
    /// A root page that cannot be fetched is not an `Err`: the result has an
    /// empty `html` and the failure in `errors`.
    pub async fn import_url(&self, url: &str) -> Result<ImportResult> {
        tracing::info!("Importing {}", url);

        let page = match self.fetch_page(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Failed to fetch {}: {}", url, e);
                return Ok(ImportResult::failed(e.to_issue()));
            }
        };

        // Redirects move the base that relative references resolve against
        let options = self.options.with_source_url(&page.final_url);
        self.import_html(&page.text(), &options).await
    }

    /// Imports already fetched HTML
    pub async fn import_html(&self, html: &str, options: &ImportOptions) -> Result<ImportResult> {
        let base = options
            .source_url
            .as_deref()
            .map(BaseUrl::parse)
            .transpose()?;
        let base = base.as_ref();
        let timeout = self.timeout(options);
        let mut diag = Diagnostics::new();

        let mut html = normalize_text(html);

        if options.convert_relative_urls {
            if let Some(base) = base {
                html = absolutize_urls(&html, base)?;
            }
        }

        let mut resources = extract_resources(&html, base).without_trackers(&self.policy);
        if !options.preserve_images {
            resources.images.clear();
        }

        let inlined_css = if options.inline_external_css {
            let inliner = Inliner::new(&self.fetcher, &self.policy, timeout, self.batch_size);
            let outcome = inliner
                .inline_stylesheets(&html, &resources.css, base, &mut diag)
                .await?;
            html = outcome.html;
            outcome.css
        } else {
            existing_inlined_css(&html)
        };

        if options.inline_images {
            html = inline_images(&html, base, &self.fetcher, timeout, self.batch_size, &mut diag)
                .await?;
        }

        if options.cleanup_html {
            let sanitize = SanitizeOptions {
                keep_external_scripts: options.preserve_external_js,
            };
            html = fix_common_issues(&html, &self.policy, sanitize, &mut diag)?;
            if !options.preserve_external_js {
                resources.js.clear();
            }
        }

        if options.preserve_external_css || options.preserve_fonts {
            let css: &[String] = if options.preserve_external_css { &resources.css } else { &[] };
            let fonts: &[String] = if options.preserve_fonts { &resources.fonts } else { &[] };
            html = ensure_stylesheets_and_fonts(&html, css, fonts, &self.policy);
        }

        html = fix_cdn_attributes(&html)?;

        if options.preserve_structure {
            html = ensure_document_structure(&html, &mut diag)?;
        }

        if options.preserve_meta_tags {
            html = ensure_meta_tags(&html);
        }

        if let Some(base) = base {
            html = add_base_tag(&html, base);
        }

        let frameworks = self.frameworks.detect(&html, &resources.css);

        tracing::info!(
            "Import finished: {} stylesheets, {} errors, {} warnings",
            resources.css.len(),
            diag.errors.len(),
            diag.warnings.len()
        );

        Ok(ImportResult {
            html,
            css: resources.css,
            js: resources.js,
            fonts: resources.fonts,
            images: resources.images,
            frameworks,
            errors: diag.errors,
            warnings: diag.warnings,
            inlined_css,
        })
    }

    /// Fetches, imports and analyzes `url`
    ///
    /// Unlike [`Importer::import_url`], a root fetch failure is an `Err`.
    pub async fn analyze_url(&self, url: &str) -> Result<WebsiteAnalysis> {
        let page = self.fetch_page(url).await?;
        let options = self.options.with_source_url(&page.final_url);
        self.analyze_html(&page.text(), &options).await
    }

    /// Imports `html` and analyzes the normalized result
    ///
    /// Import errors and warnings are carried into the analysis warnings.
    pub async fn analyze_html(&self, html: &str, options: &ImportOptions) -> Result<WebsiteAnalysis> {
        let imported = self.import_html(html, options).await?;
        let base = options
            .source_url
            .as_deref()
            .map(BaseUrl::parse)
            .transpose()?;

        // Whatever is still linked after inlining stayed external
        let external_css = extract_stylesheet_urls(&imported.html, base.as_ref());

        let mut analysis = analyze_website(AnalysisInput {
            html: &imported.html,
            inlined_css: &imported.inlined_css,
            external_css: &external_css,
            font_urls: &imported.fonts,
            source: base.as_ref(),
        });

        let mut warnings = imported.errors;
        warnings.extend(imported.warnings);
        warnings.append(&mut analysis.warnings);
        analysis.warnings = warnings;

        Ok(analysis)
    }

    fn timeout(&self, options: &ImportOptions) -> Duration {
        options
            .fetch_timeout
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.fetcher.default_timeout())
    }
}
