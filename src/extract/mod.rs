//! Resource and framework extraction
//!
//! Read-only scans over a document: which stylesheets, scripts, fonts and
//! images it references, and which CSS frameworks it appears to use.

mod frameworks;
mod resources;

pub use frameworks::{FrameworkDetector, FrameworkTag};
pub use resources::{extract_resources, extract_stylesheet_urls, ExtractedResources};
