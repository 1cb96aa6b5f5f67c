//! Image embedding as base64 `data:` URIs

use crate::diagnostics::{Diagnostics, Issue, IssueKind};
use crate::fetch::{fetch_batched, Fetched, Fetcher, ResourceKind};
use crate::html::{rewrite, select_all};
use crate::url::{canonical_key, dedup_urls, is_http_url, resolve_with, BaseUrl};
use crate::MirrorError;
use base64::Engine;
use lol_html::{element, Settings};
use scraper::Html;
use std::collections::HashMap;
use std::time::Duration;

/// Replaces `<img src>` of fetchable images with `data:` URIs
///
/// Images over the configured size limit or served with a non-image content
/// type keep their URL; each is recorded as a warning.
pub async fn inline_images(
    html: &str,
    page_base: Option<&BaseUrl>,
    fetcher: &Fetcher,
    timeout: Duration,
    batch_size: usize,
    diag: &mut Diagnostics,
) -> Result<String, MirrorError> {
    let sources = {
        let document = Html::parse_document(html);
        dedup_urls(
            select_all(&document, "img[src]")
                .into_iter()
                .filter_map(|el| el.value().attr("src"))
                .map(|src| resolve_with(page_base, src))
                .filter(|src| is_http_url(src)),
        )
    };

    if sources.is_empty() {
        return Ok(html.to_string());
    }

    tracing::debug!("Inlining {} images", sources.len());
    let outcomes = fetch_batched(fetcher, &sources, ResourceKind::Image, timeout, batch_size).await;

    let mut data_uris: HashMap<String, String> = HashMap::new();
    for (url, result) in outcomes {
        match result {
            Ok(fetched) => match to_data_uri(&fetched) {
                Some(uri) => {
                    data_uris.insert(canonical_key(&url), uri);
                }
                None => diag.warn(Issue::for_url(
                    IssueKind::ContentTypeMismatch,
                    url,
                    format!("Expected an image, got '{}'", fetched.content_type),
                )),
            },
            Err(e) => diag.warn(e.to_issue()),
        }
    }

    if data_uris.is_empty() {
        return Ok(html.to_string());
    }

    let output = rewrite(
        html,
        Settings {
            element_content_handlers: vec![element!("img[src]", |el| {
                if let Some(src) = el.get_attribute("src") {
                    let key = canonical_key(&resolve_with(page_base, &src));
                    if let Some(uri) = data_uris.get(&key) {
                        el.set_attribute("src", uri)?;
                        el.remove_attribute("srcset");
                    }
                }
                Ok(())
            })],
            ..Settings::default()
        },
    )?;
    Ok(output)
}

/// Encodes a fetched body as `data:<mime>;base64,<payload>`
fn to_data_uri(fetched: &Fetched) -> Option<String> {
    let mime = image_mime(&fetched.content_type, &fetched.url)?;

    let mut encoded = String::with_capacity(mime.len() + 13 + fetched.body.len() * 4 / 3 + 4);
    encoded.push_str("data:");
    encoded.push_str(&mime);
    encoded.push_str(";base64,");
    base64::engine::general_purpose::STANDARD.encode_string(&fetched.body, &mut encoded);
    Some(encoded)
}

/// MIME type from the header, or from the file extension when the header is generic
fn image_mime(content_type: &str, url: &str) -> Option<String> {
    let declared = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if declared.starts_with("image/") {
        return Some(declared);
    }
    if !declared.is_empty() && declared != "application/octet-stream" {
        return None;
    }

    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    let ext = path.rsplit('.').next().unwrap_or("");
    let mime = match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        _ => return None,
    };
    Some(mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched(content_type: &str, url: &str, body: &[u8]) -> Fetched {
        Fetched {
            url: url.to_string(),
            final_url: url.to_string(),
            status_code: 200,
            content_type: content_type.to_string(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_data_uri_from_header() {
        let uri = to_data_uri(&fetched("image/png", "https://a.com/x", b"abc")).unwrap();
        assert_eq!(uri, "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_data_uri_from_extension() {
        let uri = to_data_uri(&fetched("", "https://a.com/logo.SVG?v=2", b"<svg/>")).unwrap();
        assert!(uri.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_html_is_not_an_image() {
        assert!(to_data_uri(&fetched("text/html", "https://a.com/x.png", b"<html>")).is_none());
    }
}
