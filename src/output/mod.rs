//! Output module for writing import results
//!
//! This module handles:
//! - Printing reports as JSON
//! - Mirroring imported pages into a directory
//! - Generating a markdown summary of multi-page imports

mod markdown;
mod traits;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use traits::{OutputError, OutputHandler, OutputResult, Report};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the JSON file written next to mirrored pages
pub const RESULT_FILE: &str = "result.json";

/// Name of the markdown summary of a multi-page import
pub const SUMMARY_FILE: &str = "summary.md";

/// Writes reports as JSON to any writer
pub struct JsonOutput<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonOutput<W> {
    pub fn new(writer: W, pretty: bool) -> Self {
        Self { writer, pretty }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputHandler for JsonOutput<W> {
    fn emit(&mut self, report: &Report) -> OutputResult<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, report)?;
        } else {
            serde_json::to_writer(&mut self.writer, report)?;
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Mirrors reports into a directory
///
/// # Layout
///
/// - Import: `index.html` plus `result.json`
/// - Multi-page import: one file per page under its suggested filename,
///   `result.json` and `summary.md`
/// - Analysis and page lists: `result.json` only
pub struct DirectoryOutput {
    dir: PathBuf,
}

impl DirectoryOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write_file(&self, name: &str, contents: &str) -> OutputResult<()> {
        let path = self.dir.join(safe_file_name(name)?);
        fs::write(&path, contents)?;
        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl OutputHandler for DirectoryOutput {
    fn emit(&mut self, report: &Report) -> OutputResult<()> {
        fs::create_dir_all(&self.dir)?;

        match report {
            Report::Import(result) => self.write_file("index.html", &result.html)?,
            Report::Site(result) => {
                for page in &result.pages {
                    self.write_file(&page.filename, &page.html)?;
                }
                generate_markdown_summary(result, &self.dir.join(SUMMARY_FILE))?;
            }
            Report::Analysis(_) | Report::Pages(_) => {}
        }

        self.write_file(RESULT_FILE, &serde_json::to_string_pretty(report)?)?;
        tracing::info!("Output written to {}", self.dir.display());
        Ok(())
    }
}

/// Rejects names that would escape the output directory
fn safe_file_name(name: &str) -> OutputResult<&str> {
    let path = Path::new(name);
    let single = path.components().count() == 1
        && path.file_name().is_some_and(|f| f == path.as_os_str());
    if name.is_empty() || !single {
        return Err(OutputError::Write(format!("Refusing to write outside output directory: {}", name)));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{ImportedPage, MultiPageImportResult};
    use crate::pipeline::ImportResult;

    #[test]
    fn test_json_output() {
        let mut out = JsonOutput::new(Vec::new(), false);
        out.emit(&Report::Pages(Vec::new())).unwrap();
        assert_eq!(String::from_utf8(out.into_inner()).unwrap(), "[]\n");
    }

    #[test]
    fn test_directory_output_for_site() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = DirectoryOutput::new(dir.path().join("mirror"));

        let result = MultiPageImportResult {
            pages: vec![
                ImportedPage {
                    filename: "index.html".into(),
                    html: "<h1>Home</h1>".into(),
                    title: "Home".into(),
                    url: "https://acme.test/".into(),
                },
                ImportedPage {
                    filename: "about.html".into(),
                    html: "<h1>About</h1>".into(),
                    title: "About".into(),
                    url: "https://acme.test/about".into(),
                },
            ],
            ..MultiPageImportResult::default()
        };
        out.emit(&Report::Site(result)).unwrap();

        let root = dir.path().join("mirror");
        assert_eq!(fs::read_to_string(root.join("about.html")).unwrap(), "<h1>About</h1>");
        assert!(root.join(RESULT_FILE).exists());
        assert!(root.join(SUMMARY_FILE).exists());
    }

    #[test]
    fn test_directory_output_for_import() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = DirectoryOutput::new(dir.path());
        let result = ImportResult {
            html: "<!DOCTYPE html>".into(),
            ..ImportResult::default()
        };
        out.emit(&Report::Import(result)).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("index.html")).unwrap(), "<!DOCTYPE html>");
    }

    #[test]
    fn test_unsafe_names_rejected() {
        assert!(safe_file_name("../x.html").is_err());
        assert!(safe_file_name("a/b.html").is_err());
        assert!(safe_file_name("").is_err());
        assert!(safe_file_name("about.html").is_ok());
    }
}
