//! Page composition: a resolved document bound to its rendered body.

use log::{debug, info};

use quire_core::{Slug, TocEntry};

use crate::{
    error::QuireError,
    markdown::{ContentRenderer, RenderSummary},
    source::ContentSource,
};

/// A composed docs page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    slug: Slug,
    title: String,
    description: Option<String>,
    toc: Vec<TocEntry>,
    body_html: String,
    summary: RenderSummary,
}

impl Page {
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

    /// The rendered Markdown body.
    pub fn body_html(&self) -> &str {
        &self.body_html
    }

    /// Diagram outcomes of the body.
    pub fn summary(&self) -> RenderSummary {
        self.summary
    }
}

/// Resolves slugs and renders the matching documents.
#[derive(Debug)]
pub struct PageComposer<S> {
    source: S,
    renderer: ContentRenderer,
}

impl<S: ContentSource> PageComposer<S> {
    pub fn new(source: S, renderer: ContentRenderer) -> Self {
        Self { source, renderer }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Composes the page for `slug`.
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::NotFound`] if no document resolves; nothing is
    /// rendered in that case.
    pub async fn compose(&self, slug: &[String]) -> Result<Page, QuireError> {
        let Some(document) = self.source.resolve(slug) else {
            info!(slug:% = Slug::from(slug); "Page not found");
            return Err(QuireError::NotFound(Slug::from(slug)));
        };

        debug!(slug:% = document.slug(), title = document.title(); "Composing page");
        let content = self.renderer.render(document.body()).await;
        let summary = content.summary();

        Ok(Page {
            slug: document.slug().clone(),
            title: document.title().to_string(),
            description: document.description().map(str::to_string),
            toc: document.toc().to_vec(),
            body_html: content.into_html(),
            summary,
        })
    }

    /// Every document slug, in order.
    pub fn static_paths(&self) -> Vec<Slug> {
        self.source
            .list_all()
            .into_iter()
            .map(|document| document.slug().clone())
            .collect()
    }
}
