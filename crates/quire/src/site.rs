//! The site: composed pages wrapped in the page shell.
//!
//! [`Site::render_path`] serves a single page; [`Site::build`] writes the
//! whole site as static files:
//!
//! ```text
//! out/
//! ├── index.html            landing page
//! ├── 404.html
//! └── docs/
//!     ├── index.html        the root document
//!     └── guide/setup/index.html
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::Serialize;

use quire_core::Slug;

use crate::{
    config::{AppConfig, DiagramConfig, SiteConfig},
    engine::engine_from_config,
    error::QuireError,
    markdown::{ContentRenderer, RenderSummary},
    page::PageComposer,
    shell::Shell,
    source::{ContentSource, FsSource, PageTree},
};

/// A full HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    slug: Slug,
    html: String,
    summary: RenderSummary,
}

impl RenderedPage {
    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn summary(&self) -> RenderSummary {
        self.summary
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

/// Outcome of a static build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Files written, including the landing and not-found pages.
    pub pages: usize,
    pub diagrams: RenderSummary,
}

/// A documentation site.
#[derive(Debug)]
pub struct Site<S> {
    composer: PageComposer<S>,
    shell: Shell,
}

impl Site<FsSource> {
    /// Creates a site from configuration, loading content from disk and
    /// selecting the configured diagram engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be loaded or a template is
    /// invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, QuireError> {
        let source = FsSource::load(config.content().dir())?;
        let diagram = config.diagram();
        let renderer = ContentRenderer::new(engine_from_config(diagram))
            .with_language(diagram.language())
            .with_timeout(diagram.timeout());
        Self::new(source, renderer, config.site().clone(), diagram)
    }
}

impl<S: ContentSource> Site<S> {
    /// Creates a site over `source`.
    ///
    /// # Arguments
    ///
    /// * `source` - Where documents are resolved
    /// * `renderer` - Renders document bodies, diagrams included
    /// * `site` - Metadata shown by the shell
    /// * `diagram` - Supplies the client script and theme for deferred diagrams
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::Template`] if an embedded template is invalid.
    pub fn new(
        source: S,
        renderer: ContentRenderer,
        site: SiteConfig,
        diagram: &DiagramConfig,
    ) -> Result<Self, QuireError> {
        Ok(Self {
            composer: PageComposer::new(source, renderer),
            shell: Shell::new(site, diagram)?,
        })
    }

    pub fn composer(&self) -> &PageComposer<S> {
        &self.composer
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Renders the docs page at `slug` as a full HTML document.
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::NotFound`] if no document resolves.
    pub async fn render_path(&self, slug: &[String]) -> Result<RenderedPage, QuireError> {
        let page = self.composer.compose(slug).await?;
        let tree = PageTree::build(self.composer.source(), Some(page.slug()));
        let html = self.shell.render_docs(&page, &tree)?;

        Ok(RenderedPage {
            slug: page.slug().clone(),
            html,
            summary: page.summary(),
        })
    }

    pub fn render_landing(&self) -> Result<String, QuireError> {
        self.shell.render_landing()
    }

    pub fn render_not_found(&self) -> Result<String, QuireError> {
        self.shell.render_not_found()
    }

    /// Writes every page of the site below `out_dir`.
    ///
    /// Pages are rendered one at a time in slug order. Diagram failures do
    /// not fail the build; they are counted in the report.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written or a template fails.
    pub async fn build(&self, out_dir: &Path) -> Result<BuildReport, QuireError> {
        info!(out_dir:? = out_dir; "Building site");
        let mut report = BuildReport::default();

        write_file(&out_dir.join("index.html"), &self.render_landing()?)?;
        report.pages += 1;

        for slug in self.composer.static_paths() {
            let page = self.render_path(slug.segments()).await?;
            let path = page_path(out_dir, &slug);
            write_file(&path, page.html())?;

            debug!(slug:% = slug, path:? = path; "Page written");
            report.pages += 1;
            report.diagrams.merge(page.summary());
        }

        write_file(&out_dir.join("404.html"), &self.render_not_found()?)?;
        report.pages += 1;

        info!(
            pages = report.pages,
            rendered = report.diagrams.rendered,
            failed = report.diagrams.failed,
            deferred = report.diagrams.deferred;
            "Site built"
        );
        Ok(report)
    }
}

/// Output file of the docs page at `slug`.
fn page_path(out_dir: &Path, slug: &Slug) -> PathBuf {
    let mut path = out_dir.join("docs");
    path.extend(slug.segments());
    path.join("index.html")
}

fn write_file(path: &Path, contents: &str) -> Result<(), QuireError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| QuireError::io(parent, err))?;
    }
    fs::write(path, contents).map_err(|err| QuireError::io(path, err))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quire_core::{Document, toc::extract_toc};
    use quire_diagram::{DiagramEngine, FlowchartEngine, RenderError};

    use super::*;
    use crate::source::MemorySource;

    struct FailingEngine;

    impl DiagramEngine for FailingEngine {
        fn render(&self, _: &str, _: &str) -> Result<String, RenderError> {
            Err(RenderError::Engine("induced failure".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn site(engine: Arc<dyn DiagramEngine>) -> Site<MemorySource> {
        let overview = "## Flow\n\n```mermaid\nflowchart TD; A-->B\n```\n";
        let source = MemorySource::from_documents([
            Document::new(Slug::root(), "Overview", overview).with_toc(extract_toc(overview)),
            Document::new(Slug::from_segments(["guide"]), "Guide", "Read on."),
            Document::new(
                Slug::from_segments(["guide", "setup"]),
                "Setup",
                "```mermaid\nflowchart LR; X-->Y\n```\n",
            ),
        ])
        .unwrap();

        Site::new(
            source,
            ContentRenderer::new(engine),
            SiteConfig::new("Handbook"),
            &DiagramConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_page_path() {
        let out = Path::new("out");
        assert_eq!(page_path(out, &Slug::root()), Path::new("out/docs/index.html"));
        assert_eq!(
            page_path(out, &Slug::from_segments(["guide", "setup"])),
            Path::new("out/docs/guide/setup/index.html")
        );
    }

    #[tokio::test]
    async fn test_render_path() {
        let site = site(Arc::new(FlowchartEngine::new()));
        let page = site.render_path(&[]).await.unwrap();

        assert!(page.slug().is_root());
        assert!(page.html().contains("<title>Overview | Handbook</title>"));
        assert!(page.html().contains("<svg"));
        assert_eq!(page.summary().rendered, 1);
    }

    #[tokio::test]
    async fn test_render_path_not_found() {
        let site = site(Arc::new(FlowchartEngine::new()));
        let err = site
            .render_path(&["nonexistent-page".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, QuireError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_build_writes_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(Arc::new(FlowchartEngine::new()));

        let report = site.build(dir.path()).await.unwrap();
        assert_eq!(report.pages, 5);
        assert_eq!(report.diagrams.rendered, 2);

        for relative in [
            "index.html",
            "404.html",
            "docs/index.html",
            "docs/guide/index.html",
            "docs/guide/setup/index.html",
        ] {
            assert!(dir.path().join(relative).is_file(), "missing {relative}");
        }

        let landing = fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(landing.contains("View Docs"));
        let setup = fs::read_to_string(dir.path().join("docs/guide/setup/index.html")).unwrap();
        assert!(setup.contains("<h1>Setup</h1>"));
    }

    #[tokio::test]
    async fn test_diagram_failures_do_not_fail_build() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(Arc::new(FailingEngine));

        let report = site.build(dir.path()).await.unwrap();
        assert_eq!(report.pages, 5);
        assert_eq!(report.diagrams.failed, 2);
        assert_eq!(report.diagrams.rendered, 0);
    }
}
