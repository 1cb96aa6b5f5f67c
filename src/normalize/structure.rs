//! Document shell repair
//!
//! Pasted markup is often a fragment. The shell produced here always has one
//! doctype, one `<head>` and one `<body>`.

use crate::diagnostics::{Diagnostics, Issue, IssueKind};
use crate::html::{count_tags, find_ci, find_open_tag, has_tag, rewrite, select_all};
use crate::MirrorError;
use lol_html::{element, Settings};
use scraper::{ElementRef, Html};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// Elements that belong in `<head>` when found in a fragment, outside `<svg>`
const HEAD_ELEMENTS: &str = "style, link, meta, title, base";
const HOISTED_TAGS: &[&str] = &["style", "link", "meta", "title", "base"];

/// Completes `html` into a full document
///
/// - Full documents only get a doctype when it is missing
/// - `<body>` without `<head>` gets an empty head inserted
/// - `<head>` without `<body>` gets the remainder wrapped in a body
/// - A bare fragment gets a new shell: `<style>`/`<link>`/`<meta>`/`<title>`
///   are hoisted into the head and external scripts are moved after the body
///   content
///
/// Duplicate `<head>` or `<body>` tags are reported as a `Structure` warning
/// and left as they are.
pub fn ensure_document_structure(html: &str, diag: &mut Diagnostics) -> Result<String, MirrorError> {
    let has_html = has_tag(html, "html");
    let has_head = has_tag(html, "head");
    let has_body = has_tag(html, "body");

    if count_tags(html, "head") > 1 || count_tags(html, "body") > 1 {
        diag.warn(Issue::new(
            IssueKind::Structure,
            "Document has more than one <head> or <body>",
        ));
    }

    let document = match (has_head, has_body) {
        (true, true) if has_html => html.to_string(),
        (true, true) => format!("<html lang=\"en\">\n{}\n</html>", html),
        (false, true) => {
            let with_head = match find_open_tag(html, "body") {
                Some(idx) => format!(
                    "{}<head>\n<meta charset=\"UTF-8\">\n</head>\n{}",
                    &html[..idx],
                    &html[idx..]
                ),
                None => html.to_string(),
            };
            if has_html {
                with_head
            } else {
                format!("<html lang=\"en\">\n{}\n</html>", with_head)
            }
        }
        (true, false) => match find_ci(html, "</head>") {
            Some(idx) => {
                let split = idx + "</head>".len();
                let rest = strip_closing_html(&html[split..]);
                let head = strip_opening_html(&html[..split]);
                format!(
                    "<html lang=\"en\">\n{}\n<body>\n{}\n</body>\n</html>",
                    head.trim(),
                    rest.trim()
                )
            }
            None => {
                diag.warn(Issue::new(
                    IssueKind::Structure,
                    "Unclosed <head>; rebuilt the document from its content",
                ));
                build_shell(html)?
            }
        },
        (false, false) => build_shell(strip_closing_html(&strip_opening_html(html)).as_str())?,
    };

    Ok(with_doctype(&document))
}

fn with_doctype(html: &str) -> String {
    let trimmed = html.trim_start();
    if trimmed.get(..9).is_some_and(|p| p.eq_ignore_ascii_case("<!doctype")) {
        html.to_string()
    } else {
        format!("<!DOCTYPE html>\n{}", html)
    }
}

/// Builds a complete document around a fragment
fn build_shell(fragment: &str) -> Result<String, MirrorError> {
    let (hoisted, moved, scripts) = {
        let parsed = Html::parse_fragment(fragment);

        // Ordinal of each element among the elements of its tag, so the
        // streaming pass below can recognize the same elements
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut moved: HashSet<(String, usize)> = HashSet::new();
        let mut hoisted = Vec::new();
        for el in select_all(&parsed, HEAD_ELEMENTS) {
            let tag = el.value().name().to_ascii_lowercase();
            let counter = counts.entry(tag.clone()).or_insert(0);
            let ordinal = *counter;
            *counter += 1;

            if !inside_svg(el) {
                moved.insert((tag, ordinal));
                hoisted.push(el.html());
            }
        }

        let scripts: Vec<String> = select_all(&parsed, "script[src]")
            .into_iter()
            .map(|el| el.html())
            .collect();
        (hoisted, moved, scripts)
    };

    let seen: RefCell<HashMap<&str, usize>> = RefCell::new(HashMap::new());
    let mut handlers: Vec<_> = HOISTED_TAGS
        .iter()
        .map(|&tag| {
            let seen = &seen;
            let moved = &moved;
            element!(tag, move |el| {
                let ordinal = {
                    let mut seen = seen.borrow_mut();
                    let counter = seen.entry(tag).or_insert(0);
                    let ordinal = *counter;
                    *counter += 1;
                    ordinal
                };
                if moved.contains(&(tag.to_string(), ordinal)) {
                    el.remove();
                }
                Ok(())
            })
        })
        .collect();
    handlers.push(element!("script[src]", |el| {
        el.remove();
        Ok(())
    }));

    let body = rewrite(
        fragment,
        Settings {
            element_content_handlers: handlers,
            ..Settings::default()
        },
    )?;

    let has_charset = hoisted
        .iter()
        .any(|tag| tag.to_ascii_lowercase().contains("charset"));

    let mut out = String::with_capacity(fragment.len() + 256);
    out.push_str("<html lang=\"en\">\n<head>\n");
    if !has_charset {
        out.push_str("<meta charset=\"UTF-8\">\n");
    }
    for tag in &hoisted {
        out.push_str(tag);
        out.push('\n');
    }
    out.push_str("</head>\n<body>\n");
    out.push_str(body.trim());
    out.push('\n');
    for script in &scripts {
        out.push_str(script);
        out.push('\n');
    }
    out.push_str("</body>\n</html>");

    Ok(out)
}

fn inside_svg(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(|node| node.value().as_element())
        .any(|ancestor| ancestor.name().eq_ignore_ascii_case("svg"))
}

fn strip_opening_html(html: &str) -> String {
    match find_open_tag(html, "html") {
        Some(start) => match html[start..].find('>') {
            Some(end) => format!("{}{}", &html[..start], &html[start + end + 1..]),
            None => html.to_string(),
        },
        None => html.to_string(),
    }
}

fn strip_closing_html(html: &str) -> String {
    match find_ci(html, "</html>") {
        Some(idx) => format!("{}{}", &html[..idx], &html[idx + "</html>".len()..]),
        None => html.to_string(),
    }
}
