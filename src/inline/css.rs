//! Stylesheet text rewriting
//!
//! References inside a fetched stylesheet are relative to the stylesheet, not
//! to the page that linked it. Once the text is embedded in the page they must
//! be absolute.

use crate::url::{is_passthrough, BaseUrl};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CSS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"url\(\s*(['"]?)([^'")]*?)(['"]?)\s*\)"#)
        .expect("BUG: hardcoded css url() regex is invalid")
});

static CSS_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@import\s+(['"])([^'"]+)(['"])"#)
        .expect("BUG: hardcoded css @import regex is invalid")
});

static STYLE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(style)").expect("BUG: hardcoded style end regex is invalid"));

/// Rewrites every `url()` and `@import "..."` target to an absolute URL
///
/// # Examples
///
/// ```
/// use sumi_mirror::inline::rewrite_css_urls;
/// use sumi_mirror::url::BaseUrl;
///
/// let sheet = BaseUrl::parse("https://cdn.site.com/assets/css/main.css").unwrap();
/// let css = "body { background: url('../img/bg.png'); } @import \"print.css\";";
/// assert_eq!(
///     rewrite_css_urls(css, &sheet),
///     "body { background: url('https://cdn.site.com/assets/img/bg.png'); } \
///      @import \"https://cdn.site.com/assets/css/print.css\";"
/// );
/// ```
pub fn rewrite_css_urls(css: &str, base: &BaseUrl) -> String {
    let rewritten = CSS_URL.replace_all(css, |cap: &Captures| {
        let target = cap[2].trim();
        if target.is_empty() || is_passthrough(target) {
            return cap[0].to_string();
        }
        format!("url({}{}{})", &cap[1], base.resolve(target), &cap[3])
    });

    CSS_IMPORT
        .replace_all(&rewritten, |cap: &Captures| {
            format!("@import {}{}{}", &cap[1], base.resolve(&cap[2]), &cap[3])
        })
        .into_owned()
}

/// Makes stylesheet text safe to embed inside a `<style>` element
pub fn escape_style_text(css: &str) -> String {
    STYLE_END
        .replace_all(css, |cap: &Captures| format!("<\\/{}", &cap[1]))
        .into_owned()
}
