//! HTML normalization and sanitizing stages
//!
//! Each stage is a pure `&str -> String` rewrite that can run on its own. The
//! import pipeline chains them in a fixed order: text normalization and URL
//! absolutization first, since every later stage assumes absolute URLs.
//!
//! Every insertion stage checks before inserting, so running a stage twice
//! leaves the document unchanged.

mod head;
mod sanitize;
mod structure;

pub use head::{add_base_tag, ensure_meta_tags, ensure_stylesheets_and_fonts};
pub use sanitize::{fix_cdn_attributes, fix_common_issues, repair_photo_src, SanitizeOptions};
pub use structure::ensure_document_structure;

use crate::html::rewrite;
use crate::inline::rewrite_css_urls;
use crate::url::BaseUrl;
use crate::MirrorError;
use lol_html::html_content::{ContentType, Element};
use lol_html::{element, text, HandlerResult, Settings};
use std::cell::RefCell;

/// Strips a byte-order mark, unifies line endings and trims outer whitespace
pub fn normalize_text(html: &str) -> String {
    html.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .to_string()
}

/// Rewrites every URL-bearing attribute and inline CSS `url()` to absolute
///
/// Covered: `src`, `href` on `a`/`link`/`area`, `srcset`, `poster`,
/// `data-src`, `action`, `style` attributes and `<style>` element text.
/// Fragment links and `data:`/`mailto:`/`javascript:` references are left
/// alone.
pub fn absolutize_urls(html: &str, base: &BaseUrl) -> Result<String, MirrorError> {
    let style_buffer = RefCell::new(String::new());

    let output = rewrite(
        html,
        Settings {
            element_content_handlers: vec![
                element!("[src]", |el| absolutize_attr(el, "src", base)),
                element!("a[href]", |el| absolutize_attr(el, "href", base)),
                element!("link[href]", |el| absolutize_attr(el, "href", base)),
                element!("area[href]", |el| absolutize_attr(el, "href", base)),
                element!("[poster]", |el| absolutize_attr(el, "poster", base)),
                element!("[data-src]", |el| absolutize_attr(el, "data-src", base)),
                element!("form[action]", |el| absolutize_attr(el, "action", base)),
                element!("[srcset]", |el| {
                    if let Some(srcset) = el.get_attribute("srcset") {
                        el.set_attribute("srcset", &absolutize_srcset(&srcset, base))?;
                    }
                    Ok(())
                }),
                element!("[style]", |el| {
                    if let Some(style) = el.get_attribute("style") {
                        if style.contains("url(") {
                            el.set_attribute("style", &rewrite_css_urls(&style, base))?;
                        }
                    }
                    Ok(())
                }),
                text!("style", |t| {
                    style_buffer.borrow_mut().push_str(t.as_str());
                    t.remove();
                    if t.last_in_text_node() {
                        let css = std::mem::take(&mut *style_buffer.borrow_mut());
                        t.replace(&rewrite_css_urls(&css, base), ContentType::Html);
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
    )?;
    Ok(output)
}

fn absolutize_attr(el: &mut Element<'_, '_>, name: &str, base: &BaseUrl) -> HandlerResult {
    if let Some(value) = el.get_attribute(name) {
        let resolved = base.resolve(&value);
        if resolved != value {
            el.set_attribute(name, &resolved)?;
        }
    }
    Ok(())
}

fn absolutize_srcset(srcset: &str, base: &BaseUrl) -> String {
    srcset
        .split(',')
        .map(|candidate| {
            let candidate = candidate.trim();
            match candidate.split_once(char::is_whitespace) {
                Some((url, descriptor)) => format!("{} {}", base.resolve(url), descriptor.trim()),
                None => base.resolve(candidate),
            }
        })
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
