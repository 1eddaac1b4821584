//! Error types for Quire operations.
//!
//! This module provides the main error type [`QuireError`] which wraps the
//! failures that can occur while loading content and building a site.
//! Diagram rendering failures inside a page never surface here: the
//! [`DiagramRenderer`](crate::diagram::DiagramRenderer) contains them.

use std::{io, path::PathBuf};

use thiserror::Error;

use quire_core::{Slug, front_matter::FrontMatterError};
use quire_diagram::RenderError;

/// The main error type for Quire operations.
///
/// # Diagnostic Variants
///
/// The `Diagram` variant keeps the definition source next to the engine
/// error so parse diagnostics can be reported with source snippets.
#[derive(Debug, Error)]
pub enum QuireError {
    #[error("I/O error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Content error: {0}")]
    Content(String),

    #[error("Invalid front matter in `{path}`: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("Duplicate slug `{slug}`: defined by both {first} and {second}")]
    DuplicateSlug {
        slug: Slug,
        first: String,
        second: String,
    },

    #[error("Page not found: {}", .0.url("/docs"))]
    NotFound(Slug),

    #[error("Template error: {0}")]
    Template(String),

    #[error("{err}")]
    Diagram { err: RenderError, src: String },
}

impl QuireError {
    /// Create an `Io` error for an operation on `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Diagram` error with the associated definition source.
    pub fn new_diagram_error(err: RenderError, src: impl Into<String>) -> Self {
        Self::Diagram {
            err,
            src: src.into(),
        }
    }
}

impl From<handlebars::TemplateError> for QuireError {
    fn from(error: handlebars::TemplateError) -> Self {
        Self::Template(error.to_string())
    }
}

impl From<handlebars::RenderError> for QuireError {
    fn from(error: handlebars::RenderError) -> Self {
        Self::Template(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_uses_url() {
        let err = QuireError::NotFound(Slug::from_segments(["nonexistent-page"]));
        assert_eq!(err.to_string(), "Page not found: /docs/nonexistent-page");
    }

    #[test]
    fn test_io_error_names_path() {
        let err = QuireError::io(
            "content/docs/a.md",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("content/docs/a.md"));
    }
}
