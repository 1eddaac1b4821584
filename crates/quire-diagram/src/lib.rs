//! # Quire Diagram
//!
//! A native renderer for the flowchart subset of the Mermaid diagram
//! language, producing standalone SVG documents.
//!
//! ## Pipeline
//!
//! 1. **Parsing** ([`parse`]): the definition becomes a [`ast::Flowchart`],
//!    with every malformed statement reported as a [`error::Diagnostic`].
//! 2. **Layout** ([`layout::layout`]): nodes are ranked and positioned.
//! 3. **Export** ([`export::render_svg`]): the positioned chart is written as SVG.
//!
//! [`FlowchartEngine`] runs all three behind the [`DiagramEngine`] trait,
//! which is the seam the site generator renders diagrams through.
//!
//! ## Example
//!
//! ```
//! use quire_diagram::{DiagramEngine, FlowchartEngine};
//!
//! let engine = FlowchartEngine::new();
//! let svg = engine.render("diagram-example", "flowchart TD; A-->B").unwrap();
//! assert!(svg.contains(r#"id="diagram-example""#));
//! ```
//!
//! ## Configuration
//!
//! Rendering settings are process-wide; see the [`config`] module.

pub mod ast;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod layout;
mod parser;
mod span;

use log::debug;

pub use config::{EngineConfig, Theme};
pub use error::RenderError;
pub use parser::parse;
pub use span::Span;

/// A diagram renderer.
///
/// Implementations turn a diagram definition into SVG markup. The markup is
/// inserted into pages verbatim, so an engine must only return well-formed
/// markup.
pub trait DiagramEngine: Send + Sync {
    /// Renders `definition`, using `id` as the id of the SVG root element
    /// and as the prefix of every other id in the document.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the definition is malformed or the engine
    /// cannot run.
    fn render(&self, id: &str, definition: &str) -> Result<String, RenderError>;

    /// Returns `false` if the engine cannot run in this context, in which
    /// case the caller defers rendering to the client.
    fn is_available(&self) -> bool {
        true
    }

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// The built-in flowchart engine.
///
/// Reads the process-wide [`EngineConfig`] on every render.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowchartEngine;

impl FlowchartEngine {
    pub fn new() -> Self {
        Self
    }
}

impl DiagramEngine for FlowchartEngine {
    fn render(&self, id: &str, definition: &str) -> Result<String, RenderError> {
        let config = config::config();
        let chart = parse(definition)?;
        let layout = layout::layout(&chart, config);
        debug!(
            id = id,
            nodes = chart.node_count(),
            links = chart.links().len();
            "Rendering flowchart"
        );
        Ok(export::render_svg(id, &chart, &layout, config))
    }

    fn name(&self) -> &str {
        "flowchart"
    }
}
