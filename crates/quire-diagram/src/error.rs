//! Error and diagnostic system for the flowchart engine.
//!
//! Parsing produces [`Diagnostic`]s carrying an [`ErrorCode`], labelled
//! [`Span`](crate::Span)s and optional help text. All diagnostics from one
//! definition are wrapped in a [`ParseError`], which is in turn one variant
//! of the engine-level [`RenderError`].
//!
//! # Example
//!
//! ```
//! # use quire_diagram::error::{Diagnostic, ErrorCode};
//! # use quire_diagram::Span;
//! let diag = Diagnostic::error("unexpected `}`")
//!     .with_code(ErrorCode::E100)
//!     .with_label(Span::new(10..11), "not expected here")
//!     .with_help("node labels must close with the bracket that opened them");
//! assert_eq!(diag.to_string(), "error[E100]: unexpected `}`");
//! ```

mod diagnostic;
mod error_code;
mod parse_error;

pub use diagnostic::{Diagnostic, Label};
pub use error_code::ErrorCode;
pub use parse_error::ParseError;

use thiserror::Error;

/// Error returned by a [`DiagramEngine`](crate::DiagramEngine) render call.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The definition is malformed.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// The engine failed for a reason unrelated to the definition's syntax.
    #[error("engine error: {0}")]
    Engine(String),
}

impl RenderError {
    /// Returns the parse diagnostics, if this is a syntax error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            RenderError::Parse(err) => err.diagnostics(),
            _ => &[],
        }
    }
}
