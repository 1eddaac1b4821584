//! Markdown to HTML with diagram blocks routed to the diagram renderer.
//!
//! A fenced code block whose language tag equals the configured diagram
//! language becomes a [`DiagramRenderer`]; its settled view is inserted as
//! raw HTML. Every other event goes to the default HTML writer untouched,
//! except that headings without an explicit id receive the anchor the table
//! of contents links to.

use std::{sync::Arc, time::Duration};

use log::debug;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Parser, Tag, TagEnd, html};

use quire_core::{Slugger, toc::markdown_options};
use quire_diagram::DiagramEngine;

use crate::diagram::{DiagramRenderer, RenderResult};

/// Default language tag of diagram blocks.
pub const DEFAULT_DIAGRAM_LANGUAGE: &str = "mermaid";

/// Diagram outcomes for one rendered body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderSummary {
    pub rendered: usize,
    pub failed: usize,
    pub deferred: usize,
}

impl RenderSummary {
    /// Adds the counts of `other`.
    pub fn merge(&mut self, other: RenderSummary) {
        self.rendered += other.rendered;
        self.failed += other.failed;
        self.deferred += other.deferred;
    }

    /// Total number of diagram blocks.
    pub fn total(&self) -> usize {
        self.rendered + self.failed + self.deferred
    }
}

/// HTML for one Markdown body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContent {
    html: String,
    summary: RenderSummary,
}

impl RenderedContent {
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

/// Renders Markdown bodies.
#[derive(Clone)]
pub struct ContentRenderer {
    engine: Arc<dyn DiagramEngine>,
    language: String,
    timeout: Option<Duration>,
}

impl ContentRenderer {
    /// Creates a renderer routing `mermaid` blocks to `engine`.
    pub fn new(engine: Arc<dyn DiagramEngine>) -> Self {
        Self {
            engine,
            language: DEFAULT_DIAGRAM_LANGUAGE.to_string(),
            timeout: None,
        }
    }

    /// Sets the language tag that marks a diagram block.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the per-diagram timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Renders `markdown` to HTML, waiting for every diagram to settle.
    pub async fn render(&self, markdown: &str) -> RenderedContent {
        let events: Vec<Event<'_>> = Parser::new_ext(markdown, markdown_options()).collect();
        let mut output = Vec::with_capacity(events.len());
        let mut summary = RenderSummary::default();
        let mut slugger = Slugger::new();

        let mut events = events.into_iter();
        while let Some(event) = events.next() {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))
                    if self.is_diagram(&info) =>
                {
                    let text = collect_text(&mut events, |end| {
                        matches!(end, TagEnd::CodeBlock)
                    });
                    output.push(Event::Html(self.render_diagram(text, &mut summary).await.into()));
                }
                Event::Start(Tag::Heading {
                    level,
                    id: None,
                    classes,
                    attrs,
                }) => {
                    let mut inner = Vec::new();
                    let mut title = String::new();
                    for event in events.by_ref() {
                        let end = matches!(event, Event::End(TagEnd::Heading(_)));
                        if let Event::Text(text) | Event::Code(text) = &event {
                            title.push_str(text);
                        }
                        inner.push(event);
                        if end {
                            break;
                        }
                    }
                    let anchor = slugger.slug(&title);
                    output.push(Event::Start(Tag::Heading {
                        level,
                        id: Some(CowStr::from(anchor)),
                        classes,
                        attrs,
                    }));
                    output.extend(inner);
                }
                Event::Start(Tag::Heading { id: Some(ref id), .. }) => {
                    slugger.reserve(id);
                    output.push(event);
                }
                event => output.push(event),
            }
        }

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, output.into_iter());

        if summary.total() > 0 {
            debug!(
                rendered = summary.rendered,
                failed = summary.failed,
                deferred = summary.deferred;
                "Rendered diagrams"
            );
        }
        RenderedContent {
            html: html_output,
            summary,
        }
    }

    /// `true` if the first word of a fenced block's info string is the
    /// diagram language.
    fn is_diagram(&self, info: &str) -> bool {
        info.split_whitespace().next() == Some(self.language.as_str())
    }

    async fn render_diagram(&self, text: String, summary: &mut RenderSummary) -> String {
        let mut renderer =
            DiagramRenderer::new(Arc::clone(&self.engine)).with_timeout(self.timeout);
        renderer.set_text(text);
        match renderer.settle().await {
            RenderResult::Success(_) => summary.rendered += 1,
            RenderResult::Failure(_) => summary.failed += 1,
            RenderResult::Pending => summary.deferred += 1,
        }
        renderer.view()
    }
}

impl std::fmt::Debug for ContentRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentRenderer")
            .field("engine", &self.engine.name())
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Concatenates text events up to the end tag matched by `is_end`.
fn collect_text<'a>(
    events: &mut impl Iterator<Item = Event<'a>>,
    is_end: impl Fn(&TagEnd) -> bool,
) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(end) if is_end(&end) => break,
            Event::Text(chunk) => text.push_str(&chunk),
            _ => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use quire_diagram::{FlowchartEngine, RenderError};

    use super::*;
    use crate::diagram::{CONTAINER_CLASS, ERROR_FALLBACK};

    /// Records every definition it receives.
    #[derive(Default)]
    struct RecordingEngine {
        seen: Mutex<Vec<String>>,
    }

    impl DiagramEngine for RecordingEngine {
        fn render(&self, _id: &str, definition: &str) -> Result<String, RenderError> {
            self.seen.lock().unwrap().push(definition.to_string());
            Ok("<svg>recorded</svg>".to_string())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct FailingEngine;

    impl DiagramEngine for FailingEngine {
        fn render(&self, _id: &str, _definition: &str) -> Result<String, RenderError> {
            Err(RenderError::Engine("induced failure".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn default_html(markdown: &str) -> String {
        let mut out = String::new();
        html::push_html(&mut out, Parser::new_ext(markdown, markdown_options()));
        out
    }

    #[tokio::test]
    async fn test_diagram_block_gets_exact_text() {
        let engine = Arc::new(RecordingEngine::default());
        let renderer = ContentRenderer::new(engine.clone());

        let content = renderer
            .render("Intro\n\n```mermaid\nflowchart TD\n  A-->B\n```\n")
            .await;

        assert_eq!(
            engine.seen.lock().unwrap().as_slice(),
            ["flowchart TD\n  A-->B\n".to_string()]
        );
        assert!(content.html().contains("<svg>recorded</svg>"));
        assert!(content.html().contains(CONTAINER_CLASS));
        assert_eq!(content.summary().rendered, 1);
    }

    #[tokio::test]
    async fn test_other_code_blocks_match_default_rendering() {
        let engine = Arc::new(RecordingEngine::default());
        let renderer = ContentRenderer::new(engine.clone());

        for markdown in [
            "```rust\nfn main() {}\n```\n",
            "```mermaidx\ngraph TD\n```\n",
            "```\nplain <b>\n```\n",
            "    indented code\n",
            "Text with `mermaid` inline\n",
        ] {
            let content = renderer.render(markdown).await;
            assert_eq!(content.html(), default_html(markdown), "for {markdown:?}");
        }
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_language_is_first_word_of_info() {
        let engine = Arc::new(RecordingEngine::default());
        let renderer = ContentRenderer::new(engine.clone());
        renderer.render("```mermaid title=\"x\"\ngraph TD\n```\n").await;
        assert_eq!(engine.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_custom_language() {
        let engine = Arc::new(RecordingEngine::default());
        let renderer = ContentRenderer::new(engine.clone()).with_language("flow");

        let content = renderer
            .render("```flow\ngraph TD\n```\n\n```mermaid\ngraph TD\n```\n")
            .await;
        assert_eq!(engine.seen.lock().unwrap().len(), 1);
        assert!(content.html().contains("language-mermaid"));
    }

    #[tokio::test]
    async fn test_failed_diagram_shows_fallback() {
        let renderer = ContentRenderer::new(Arc::new(FailingEngine));
        let content = renderer.render("```mermaid\nflowchart TD; A-->B\n```\n").await;

        assert!(content.html().contains(ERROR_FALLBACK));
        assert!(!content.html().contains("Loading diagram..."));
        assert_eq!(content.summary().failed, 1);
    }

    #[tokio::test]
    async fn test_native_engine_renders_svg() {
        let renderer = ContentRenderer::new(Arc::new(FlowchartEngine::new()));
        let content = renderer.render("```mermaid\nflowchart TD; A-->B\n```\n").await;
        assert!(content.html().contains("<svg"));
        assert_eq!(content.summary().rendered, 1);
    }

    #[tokio::test]
    async fn test_headings_get_toc_anchors() {
        let renderer = ContentRenderer::new(Arc::new(RecordingEngine::default()));
        let content = renderer
            .render("## Getting Started\n\n## Getting Started\n\n## Custom {#mine}\n")
            .await;

        let html = content.html();
        assert!(html.contains(r#"<h2 id="getting-started">Getting Started</h2>"#));
        assert!(html.contains(r#"<h2 id="getting-started-1">Getting Started</h2>"#));
        assert!(html.contains(r#"<h2 id="mine">Custom</h2>"#));

        let toc = quire_core::toc::extract_toc(
            "## Getting Started\n\n## Getting Started\n\n## Custom {#mine}\n",
        );
        for entry in toc {
            let anchor = entry.url().trim_start_matches('#');
            assert!(html.contains(&format!(r#"id="{anchor}""#)));
        }
    }

    #[tokio::test]
    async fn test_generated_anchor_avoids_explicit_id() {
        let markdown = "## Intro {#setup}\n\n## Setup\n";
        let renderer = ContentRenderer::new(Arc::new(RecordingEngine::default()));
        let html = renderer.render(markdown).await.html().to_string();

        assert!(html.contains(r#"<h2 id="setup">Intro</h2>"#));
        assert!(html.contains(r#"<h2 id="setup-1">Setup</h2>"#));

        let toc = quire_core::toc::extract_toc(markdown);
        assert_eq!(toc[1].url(), "#setup-1");
    }

    #[test]
    fn test_summary_merge() {
        let mut summary = RenderSummary {
            rendered: 1,
            failed: 0,
            deferred: 2,
        };
        summary.merge(RenderSummary {
            rendered: 2,
            failed: 1,
            deferred: 0,
        });
        assert_eq!(summary.total(), 6);
        assert_eq!(summary.rendered, 3);
    }
}
