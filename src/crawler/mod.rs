//! Multi-page crawling
//!
//! This module contains the site-level logic, including:
//! - Detecting same-origin pages linked from a document
//! - Importing several pages through the pipeline in order
//! - Merging shared stylesheets, fonts and frameworks

mod coordinator;
mod pages;

pub use coordinator::{Coordinator, ImportedPage, MultiPageImportResult};
pub use pages::{detect_internal_pages, suggested_filename, DetectedPage};
