//! Quire - A static documentation site generator.
//!
//! Markdown pages are loaded from a content directory, rendered to HTML and
//! wrapped in a page shell. Fenced code blocks tagged with the diagram
//! language are rendered to SVG at build time through a
//! [`DiagramEngine`](quire_diagram::DiagramEngine); blocks the engine cannot
//! handle are left to the browser.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use quire::{Site, config::AppConfig};
//!
//! # async fn run() -> Result<(), quire::QuireError> {
//! let config = AppConfig::default().with_content_dir("content/docs");
//! let site = Site::from_config(&config)?;
//! let report = site.build(Path::new("out")).await?;
//! println!("{} pages written", report.pages);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diagram;
pub mod engine;
pub mod markdown;
pub mod page;
pub mod shell;
pub mod site;
pub mod source;

mod error;

pub use quire_core::{Document, Slug, TocEntry};

pub use error::QuireError;
pub use site::{BuildReport, RenderedPage, Site};

use log::info;

use quire_diagram::{DiagramEngine, FlowchartEngine};

/// URL prefix of every docs page.
pub const DOCS_BASE: &str = "/docs";

/// Renders one diagram definition with the built-in engine.
///
/// # Arguments
///
/// * `id` - Id of the SVG root element
/// * `source` - The diagram definition
///
/// # Errors
///
/// Returns [`QuireError::Diagram`] carrying `source`, so parse diagnostics
/// can be reported against it.
pub fn render_diagram(id: &str, source: &str) -> Result<String, QuireError> {
    info!(id = id; "Rendering diagram");
    FlowchartEngine::new()
        .render(id, source)
        .map_err(|err| QuireError::new_diagram_error(err, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_diagram() {
        let svg = render_diagram("diagram-cli", "flowchart LR\nA --> B").unwrap();
        assert!(svg.contains(r#"id="diagram-cli""#));
    }

    #[test]
    fn test_render_diagram_keeps_source() {
        let source = "flowchart TD\nA[unclosed --> B";
        let err = render_diagram("d", source).unwrap_err();
        match err {
            QuireError::Diagram { err, src } => {
                assert_eq!(src, source);
                assert!(!err.diagnostics().is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
