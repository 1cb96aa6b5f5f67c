//! Markup repairs and tracker stripping

use crate::diagnostics::{Diagnostics, Issue, IssueKind};
use crate::html::rewrite;
use crate::policy::DomainPolicy;
use crate::MirrorError;
use lol_html::html_content::{ContentType, Element};
use lol_html::{doc_comments, element, text, HandlerResult, Settings};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

/// Bare stock-photo identifiers, optionally already made absolute
static PHOTO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?://[^/?#]+/|//[^/?#]+/|images\.unsplash\.com/)?(photo-\d{6,}-[0-9a-f]{6,})/?$")
        .expect("BUG: hardcoded photo id regex is invalid")
});

static DYNAMIC_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bimport\s*\(\s*(?:'[^']*'|"[^"]*"|`[^`]*`)\s*\)"#)
        .expect("BUG: hardcoded dynamic import regex is invalid")
});

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-_.+%\s]+").expect("BUG: hardcoded separator regex is invalid"));

const PHOTO_CDN_PARAMS: &str = "auto=format&fit=crop&w=1200&q=80";

/// Switches for [`fix_common_issues`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Keep non-tracking `<script src>` tags
    pub keep_external_scripts: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            keep_external_scripts: true,
        }
    }
}

/// Rewrites a bare photo identifier into a full CDN image URL
///
/// # Examples
///
/// ```
/// use sumi_mirror::normalize::repair_photo_src;
///
/// assert_eq!(
///     repair_photo_src("photo-1506744038136-46273834b3fb").as_deref(),
///     Some("https://images.unsplash.com/photo-1506744038136-46273834b3fb?auto=format&fit=crop&w=1200&q=80")
/// );
/// assert_eq!(repair_photo_src("/img/photo.jpg"), None);
/// ```
pub fn repair_photo_src(src: &str) -> Option<String> {
    PHOTO_ID
        .captures(src.trim())
        .map(|cap| format!("https://images.unsplash.com/{}?{}", &cap[1], PHOTO_CDN_PARAMS))
}

/// Repairs broken markup and removes tracking code
///
/// In order:
/// 1. Bare photo-ID `src` values become full CDN URLs
/// 2. Every `<img>` gets an `alt`
/// 3. IE conditional comments are removed
/// 4. Tracker scripts, noscript pixels, iframes and links are removed, by
///    domain and by inline-script signature
/// 5. Dynamic `import()` calls in inline scripts become `Promise.resolve({})`
pub fn fix_common_issues(
    html: &str,
    policy: &DomainPolicy,
    options: SanitizeOptions,
    diag: &mut Diagnostics,
) -> Result<String, MirrorError> {
    let flagged = find_tracking_blocks(html, policy)?;
    let removed = Cell::new(0usize);

    let script_ordinal = Cell::new(0usize);
    let noscript_ordinal = Cell::new(0usize);
    let script_buffer = RefCell::new(String::new());

    let output = rewrite(
        html,
        Settings {
            element_content_handlers: vec![
                element!("img", |el| {
                    if let Some(src) = el.get_attribute("src") {
                        if let Some(fixed) = repair_photo_src(&src) {
                            el.set_attribute("src", &fixed)?;
                        }
                    }
                    if el.get_attribute("alt").is_none() {
                        let alt = el
                            .get_attribute("src")
                            .map(|src| alt_from_src(&src))
                            .unwrap_or_else(|| "image".to_string());
                        el.set_attribute("alt", &alt)?;
                    }
                    Ok(())
                }),
                element!("script", |el| {
                    let ordinal = script_ordinal.get();
                    script_ordinal.set(ordinal + 1);

                    let tracking = flagged.scripts.contains(&ordinal);
                    let external = el.get_attribute("src").is_some();
                    if tracking || (external && !options.keep_external_scripts) {
                        if tracking {
                            removed.set(removed.get() + 1);
                        }
                        el.remove();
                    }
                    Ok(())
                }),
                text!("script", |t| {
                    script_buffer.borrow_mut().push_str(t.as_str());
                    t.remove();
                    if t.last_in_text_node() {
                        let source = std::mem::take(&mut *script_buffer.borrow_mut());
                        let neutralized = DYNAMIC_IMPORT.replace_all(&source, "Promise.resolve({})");
                        t.replace(&neutralized, ContentType::Html);
                    }
                    Ok(())
                }),
                element!("noscript", |el| {
                    let ordinal = noscript_ordinal.get();
                    noscript_ordinal.set(ordinal + 1);
                    if flagged.noscripts.contains(&ordinal) {
                        removed.set(removed.get() + 1);
                        el.remove();
                    }
                    Ok(())
                }),
                element!("img[src]", |el| drop_if_tracking(el, "src", policy, &removed)),
                element!("iframe[src]", |el| drop_if_tracking(el, "src", policy, &removed)),
                element!("link[href]", |el| drop_if_tracking(el, "href", policy, &removed)),
            ],
            document_content_handlers: vec![doc_comments!(|c| {
                let text = c.text();
                let text = text.trim_start();
                if text.starts_with("[if") || text.starts_with("<![endif]") || text.starts_with("[endif]") {
                    c.remove();
                }
                Ok(())
            })],
            ..Settings::default()
        },
    )?;

    if removed.get() > 0 {
        diag.warn(Issue::new(
            IssueKind::Blocked,
            format!("Removed {} tracking elements", removed.get()),
        ));
    }

    Ok(output)
}

fn drop_if_tracking(
    el: &mut Element<'_, '_>,
    attr: &str,
    policy: &DomainPolicy,
    removed: &Cell<usize>,
) -> HandlerResult {
    if let Some(target) = el.get_attribute(attr) {
        if policy.is_tracking_url(&target) || policy.is_tracking_pixel(&target) {
            removed.set(removed.get() + 1);
            el.remove();
        }
    }
    Ok(())
}

/// Ordinals of `<script>` and `<noscript>` elements whose content is tracking code
#[derive(Debug, Default)]
struct TrackingBlocks {
    scripts: HashSet<usize>,
    noscripts: HashSet<usize>,
}

/// First pass: decide which blocks to drop once their full text is known
fn find_tracking_blocks(html: &str, policy: &DomainPolicy) -> Result<TrackingBlocks, MirrorError> {
    let blocks = RefCell::new(TrackingBlocks::default());

    let script_count = Cell::new(0usize);
    let noscript_count = Cell::new(0usize);
    let script_text = RefCell::new(String::new());
    let noscript_text = RefCell::new(String::new());

    rewrite(
        html,
        Settings {
            element_content_handlers: vec![
                element!("script", |el| {
                    let ordinal = script_count.get();
                    script_count.set(ordinal + 1);
                    if let Some(src) = el.get_attribute("src") {
                        if policy.is_tracking_url(&src) {
                            blocks.borrow_mut().scripts.insert(ordinal);
                        }
                    }
                    Ok(())
                }),
                text!("script", |t| {
                    script_text.borrow_mut().push_str(t.as_str());
                    if t.last_in_text_node() {
                        let body = std::mem::take(&mut *script_text.borrow_mut());
                        if policy.is_tracking_script(&body) {
                            let ordinal = script_count.get().saturating_sub(1);
                            blocks.borrow_mut().scripts.insert(ordinal);
                        }
                    }
                    Ok(())
                }),
                element!("noscript", |_el| {
                    noscript_count.set(noscript_count.get() + 1);
                    Ok(())
                }),
                text!("noscript", |t| {
                    noscript_text.borrow_mut().push_str(t.as_str());
                    if t.last_in_text_node() {
                        let body = std::mem::take(&mut *noscript_text.borrow_mut());
                        if policy.mentions_tracker(&body) {
                            let ordinal = noscript_count.get().saturating_sub(1);
                            blocks.borrow_mut().noscripts.insert(ordinal);
                        }
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
    )?;

    Ok(blocks.into_inner())
}

/// Alt text derived from an image file name, `image` when nothing usable remains
fn alt_from_src(src: &str) -> String {
    if src.starts_with("data:") {
        return "image".to_string();
    }

    let path = src.split(['?', '#']).next().unwrap_or(src);
    let file = path.rsplit('/').next().unwrap_or("");
    let stem = file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file);

    if stem.starts_with("photo-") || stem.chars().filter(|c| c.is_ascii_digit()).count() * 2 > stem.len() {
        return "image".to_string();
    }

    let words = NON_WORD.replace_all(stem, " ").trim().to_string();
    if words.is_empty() {
        "image".to_string()
    } else {
        words
    }
}

/// Strips `integrity` and `crossorigin` from Font Awesome assets
///
/// CDN mirrors of Font Awesome frequently serve bytes that no longer match the
/// pinned hash, which makes the browser refuse the whole stylesheet.
pub fn fix_cdn_attributes(html: &str) -> Result<String, MirrorError> {
    rewrite(
        html,
        Settings {
            element_content_handlers: vec![
                element!("link[href]", |el| strip_pinning(el, "href")),
                element!("script[src]", |el| strip_pinning(el, "src")),
            ],
            ..Settings::default()
        },
    )
}

fn strip_pinning(el: &mut Element<'_, '_>, attr: &str) -> HandlerResult {
    let target = el.get_attribute(attr).unwrap_or_default().to_ascii_lowercase();
    if target.contains("fontawesome") || target.contains("font-awesome") {
        el.remove_attribute("integrity");
        el.remove_attribute("crossorigin");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(html: &str) -> (String, Diagnostics) {
        let mut diag = Diagnostics::new();
        let out = fix_common_issues(html, &DomainPolicy::default(), SanitizeOptions::default(), &mut diag)
            .unwrap();
        (out, diag)
    }

    #[test]
    fn test_removes_tracker_script_by_domain() {
        let (out, diag) = sanitize(
            r#"<head><script async src="https://www.googletagmanager.com/gtm.js?id=GTM-X"></script><script src="/app.js"></script></head>"#,
        );
        assert!(!out.contains("googletagmanager.com"));
        assert!(out.contains("/app.js"));
        assert_eq!(diag.warnings.len(), 1);
    }

    #[test]
    fn test_removes_inline_tracker_by_signature() {
        let (out, _) = sanitize(
            "<script>window.dataLayer=window.dataLayer||[];function gtag(){dataLayer.push(arguments);}gtag('js',new Date());</script><script>var menu=1;</script>",
        );
        assert!(!out.contains("gtag"));
        assert!(out.contains("var menu=1;"));
    }

    #[test]
    fn test_removes_noscript_pixel() {
        let (out, _) = sanitize(
            r#"<body><noscript><iframe src="https://www.googletagmanager.com/ns.html?id=GTM-X" height="0" width="0"></iframe></noscript><p>ok</p></body>"#,
        );
        assert!(!out.contains("googletagmanager.com"));
        assert!(out.contains("<p>ok</p>"));
    }

    #[test]
    fn test_removes_meta_pixel() {
        let (out, diag) = sanitize(
            r#"<head><script>!function(f){f.fbq=function(){};}(window);fbq('init', '123');fbq('track', 'PageView');</script>
<noscript><img height="1" width="1" style="display:none" src="https://www.facebook.com/tr?id=123&ev=PageView&noscript=1"/></noscript></head>
<body><img src="https://px.ads.linkedin.com/collect/?pid=9&fmt=gif"><a href="https://www.facebook.com/acme">Facebook</a></body>"#,
        );
        assert!(!out.contains("facebook.com/tr"));
        assert!(!out.contains("fbq("));
        assert!(!out.contains("linkedin.com"));
        assert!(out.contains(r#"href="https://www.facebook.com/acme""#));
        assert_eq!(diag.warnings.len(), 1);
    }

    #[test]
    fn test_neutralizes_dynamic_import() {
        let (out, _) = sanitize(r#"<script>import('./chunk.js').then(m => m.run());</script>"#);
        assert_eq!(out, "<script>Promise.resolve({}).then(m => m.run());</script>");
    }

    #[test]
    fn test_conditional_comments_removed() {
        let (out, _) = sanitize("<head><!--[if lt IE 9]><script src=\"html5shiv.js\"></script><![endif]--><!-- keep --></head>");
        assert_eq!(out, "<head><!-- keep --></head>");
    }

    #[test]
    fn test_img_alt_and_photo_repair() {
        let (out, _) = sanitize(r#"<img src="photo-1506744038136-46273834b3fb"><img src="/img/team_photo-large.png"><img alt="" src="x.png">"#);
        assert!(out.contains(r#"src="https://images.unsplash.com/photo-1506744038136-46273834b3fb?auto=format&amp;fit=crop&amp;w=1200&amp;q=80""#)
            || out.contains("https://images.unsplash.com/photo-1506744038136-46273834b3fb?auto=format&fit=crop&w=1200&q=80"));
        assert!(out.contains(r#"alt="image""#));
        assert!(out.contains(r#"alt="team photo large""#));
        assert!(out.contains(r#"<img alt="" src="x.png">"#));
    }

    #[test]
    fn test_strip_external_scripts() {
        let mut diag = Diagnostics::new();
        let out = fix_common_issues(
            r#"<script src="/app.js"></script><script>var a=1;</script>"#,
            &DomainPolicy::default(),
            SanitizeOptions {
                keep_external_scripts: false,
            },
            &mut diag,
        )
        .unwrap();
        assert_eq!(out, "<script>var a=1;</script>");
    }

    #[test]
    fn test_fix_cdn_attributes() {
        let html = r#"<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css" integrity="sha512-abc" crossorigin="anonymous"><link rel="stylesheet" href="/a.css" integrity="sha512-x">"#;
        let out = fix_cdn_attributes(html).unwrap();
        assert!(!out.contains("sha512-abc"));
        assert!(!out.contains("anonymous"));
        assert!(out.contains("sha512-x"));
        assert_eq!(fix_cdn_attributes(&out).unwrap(), out);
    }

    #[test]
    fn test_alt_from_src() {
        assert_eq!(alt_from_src("https://a.com/hero-banner.jpg?w=2"), "hero banner");
        assert_eq!(alt_from_src("https://a.com/12345678.jpg"), "image");
        assert_eq!(alt_from_src("data:image/png;base64,AA"), "image");
    }
}
