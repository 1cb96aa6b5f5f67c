//! Markdown summary generation
//!
//! This module generates a human-readable summary of a multi-page import:
//! the mirrored pages, shared resources, and every recorded problem.

use crate::crawler::MultiPageImportResult;
use crate::diagnostics::Issue;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of `result` to `output_path`
pub fn generate_markdown_summary(result: &MultiPageImportResult, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(result);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a multi-page import result as markdown
pub fn format_markdown_summary(result: &MultiPageImportResult) -> String {
    let mut md = String::new();

    md.push_str("# Sumi-Mirror Import Summary\n\n");

    md.push_str("## Overview\n\n");
    md.push_str(&format!("- **Pages imported**: {}\n", result.pages.len()));
    md.push_str(&format!("- **Shared stylesheets**: {}\n", result.shared_css.len()));
    md.push_str(&format!("- **Shared fonts**: {}\n", result.shared_fonts.len()));
    if !result.frameworks.is_empty() {
        let names: Vec<&str> = result.frameworks.iter().map(|f| f.as_str()).collect();
        md.push_str(&format!("- **Frameworks**: {}\n", names.join(", ")));
    }
    md.push_str(&format!("- **Errors**: {}\n", result.errors.len()));
    md.push_str(&format!("- **Warnings**: {}\n\n", result.warnings.len()));

    if !result.pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| File | Title | URL |\n");
        md.push_str("|------|-------|-----|\n");
        for page in &result.pages {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                page.filename,
                escape_cell(&page.title),
                page.url
            ));
        }
        md.push('\n');
    }

    if !result.shared_css.is_empty() {
        md.push_str("## Shared Stylesheets\n\n");
        for url in &result.shared_css {
            md.push_str(&format!("- {}\n", url));
        }
        md.push('\n');
    }

    push_issues(&mut md, "Errors", &result.errors);
    push_issues(&mut md, "Warnings", &result.warnings);

    md
}

fn push_issues(md: &mut String, heading: &str, issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }
    md.push_str(&format!("## {}\n\n", heading));
    for issue in issues {
        md.push_str(&format!("- {}\n", issue));
    }
    md.push('\n');
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
