//! The [`Document`] content model.
//!
//! Documents are produced by a content source and are read-only for the rest
//! of the pipeline: rendering and page composition only borrow them.

use std::path::{Path, PathBuf};

use crate::{slug::Slug, toc::TocEntry};

/// A single content page.
///
/// # Examples
///
/// ```
/// # use quire_core::{Document, Slug, toc::extract_toc};
/// let body = "## Setup\n\nRun the installer.\n";
/// let doc = Document::new(Slug::root(), "Overview", body)
///     .with_description("Start here")
///     .with_toc(extract_toc(body));
///
/// assert_eq!(doc.title(), "Overview");
/// assert_eq!(doc.toc()[0].url(), "#setup");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    slug: Slug,
    title: String,
    description: Option<String>,
    toc: Vec<TocEntry>,
    body: String,
    source_path: Option<PathBuf>,
}

impl Document {
    /// Creates a document with an empty table of contents.
    pub fn new(slug: Slug, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            slug,
            title: title.into(),
            description: None,
            toc: Vec::new(),
            body: body.into(),
            source_path: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the table of contents.
    pub fn with_toc(mut self, toc: Vec<TocEntry>) -> Self {
        self.toc = toc;
        self
    }

    /// Records the file the document was loaded from.
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    /// The Markdown body, without front matter.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}
