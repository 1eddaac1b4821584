//! The diagram renderer widget.
//!
//! A [`DiagramRenderer`] owns one diagram block. Given the block's text it
//! shows a loading placeholder, renders the text on the blocking pool
//! through a [`DiagramEngine`], and then shows either the engine's markup or
//! a fixed error fallback.
//!
//! # Trust boundary
//!
//! Successful markup is inserted into the page verbatim. Engines are trusted
//! to return well-formed SVG; the built-in engine emits label text only as
//! SVG text nodes.
//!
//! # Invocations
//!
//! Every new text starts an invocation with a fresh render id and a new
//! generation number. Completions from older generations are discarded when
//! they arrive, and the previous in-flight task is aborted when a new
//! invocation starts or the renderer is dropped.

use std::{sync::Arc, time::Duration};

use log::{debug, error, trace};
use rand::Rng;
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};

use quire_diagram::DiagramEngine;

/// Shown while an invocation is pending.
pub const LOADING_PLACEHOLDER: &str =
    r#"<div class="text-muted-foreground text-sm py-8">Loading diagram...</div>"#;

/// Shown in place of any failed render.
pub const ERROR_FALLBACK: &str = r#"<pre style="color: red;">Error rendering diagram</pre>"#;

/// Class of the element wrapping every view.
pub const CONTAINER_CLASS: &str = "my-4 flex justify-center overflow-x-auto";

const RENDER_ID_PREFIX: &str = "diagram-";
const RENDER_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RENDER_ID_LEN: usize = 9;

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderResult {
    Pending,
    /// Markup returned by the engine.
    Success(String),
    /// The error that was logged; never shown to readers.
    Failure(String),
}

impl RenderResult {
    /// Returns `true` once the invocation has finished.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RenderResult::Pending)
    }
}

#[derive(Debug)]
struct Completion {
    generation: u64,
    result: RenderResult,
}

/// Renders one diagram block asynchronously.
///
/// Must be updated from within a Tokio runtime.
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use quire::diagram::{DiagramRenderer, RenderResult};
/// # use quire_diagram::FlowchartEngine;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut renderer = DiagramRenderer::new(Arc::new(FlowchartEngine::new()));
/// renderer.set_text("flowchart TD; A-->B");
///
/// assert!(matches!(renderer.settle().await, RenderResult::Success(_)));
/// assert!(renderer.view().contains("<svg"));
/// # }
/// ```
pub struct DiagramRenderer {
    engine: Arc<dyn DiagramEngine>,
    timeout: Option<Duration>,
    text: Option<String>,
    render_id: Option<String>,
    generation: u64,
    state: RenderResult,
    deferred: bool,
    task: Option<JoinHandle<()>>,
    sender: mpsc::UnboundedSender<Completion>,
    receiver: mpsc::UnboundedReceiver<Completion>,
}

impl DiagramRenderer {
    /// Creates a renderer with no text and no timeout.
    pub fn new(engine: Arc<dyn DiagramEngine>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            engine,
            timeout: None,
            text: None,
            render_id: None,
            generation: 0,
            state: RenderResult::Pending,
            deferred: false,
            task: None,
            sender,
            receiver,
        }
    }

    /// Bounds each render; a render still running after `timeout` fails.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Starts rendering `text`.
    ///
    /// Setting the text the renderer already holds is a no-op, so a
    /// finished result is never recomputed for identical input.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.text.as_deref() == Some(text.as_str()) {
            trace!(render_id:? = self.render_id; "Diagram text unchanged");
            return;
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }

        self.generation += 1;
        self.state = RenderResult::Pending;
        self.deferred = false;
        let render_id = new_render_id();
        self.render_id = Some(render_id.clone());
        self.text = Some(text.clone());

        if !self.engine.is_available() {
            debug!(
                render_id = render_id.as_str(),
                engine = self.engine.name();
                "Diagram engine unavailable, deferring to client"
            );
            self.deferred = true;
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            self.finish(RenderResult::Failure(
                "no async runtime to render the diagram on".to_string(),
            ));
            return;
        };

        let engine = Arc::clone(&self.engine);
        let sender = self.sender.clone();
        let generation = self.generation;
        let timeout = self.timeout;
        self.task = Some(runtime.spawn(async move {
            let job = tokio::task::spawn_blocking(move || engine.render(&render_id, &text));
            let joined = match timeout {
                Some(limit) => tokio::time::timeout(limit, job).await.map_err(|_| limit),
                None => Ok(job.await),
            };

            let result = match joined {
                Ok(Ok(Ok(markup))) => RenderResult::Success(markup),
                Ok(Ok(Err(err))) => RenderResult::Failure(err.to_string()),
                Ok(Err(join_error)) => {
                    RenderResult::Failure(format!("diagram engine crashed: {join_error}"))
                }
                Err(limit) => RenderResult::Failure(format!(
                    "diagram rendering timed out after {} ms",
                    limit.as_millis()
                )),
            };
            // The renderer may be gone; its result is then irrelevant.
            let _ = sender.send(Completion { generation, result });
        }));
    }

    /// The current text, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The id of the current invocation.
    pub fn render_id(&self) -> Option<&str> {
        self.render_id.as_deref()
    }

    /// The generation of the current invocation; 0 before any text.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> &RenderResult {
        &self.state
    }

    /// Returns `true` if rendering was left to the client because the
    /// engine is unavailable.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Applies every completion that has already arrived.
    ///
    /// Returns `true` if the state changed.
    pub fn try_update(&mut self) -> bool {
        let mut changed = false;
        while let Ok(completion) = self.receiver.try_recv() {
            changed |= self.apply(completion);
        }
        changed
    }

    /// Waits for the current invocation to finish.
    ///
    /// Returns immediately when there is no text or rendering is deferred;
    /// the state is then still [`RenderResult::Pending`].
    pub async fn settle(&mut self) -> &RenderResult {
        while self.is_in_flight() {
            match self.receiver.recv().await {
                Some(completion) => {
                    self.apply(completion);
                }
                None => break,
            }
        }
        &self.state
    }

    /// Renders the current state inside the display container.
    pub fn view(&self) -> String {
        let inner = match (&self.state, self.deferred) {
            (_, true) => format!(
                r#"<pre class="mermaid">{}</pre>"#,
                handlebars::html_escape(self.text.as_deref().unwrap_or_default())
            ),
            (RenderResult::Pending, false) => LOADING_PLACEHOLDER.to_string(),
            (RenderResult::Success(markup), false) => format!("<div>{markup}</div>"),
            (RenderResult::Failure(_), false) => format!("<div>{ERROR_FALLBACK}</div>"),
        };
        format!(r#"<div class="{CONTAINER_CLASS}">{inner}</div>"#)
    }

    fn is_in_flight(&self) -> bool {
        self.text.is_some() && !self.deferred && !self.state.is_terminal()
    }

    fn apply(&mut self, completion: Completion) -> bool {
        if completion.generation != self.generation {
            debug!(
                stale_generation = completion.generation,
                generation = self.generation;
                "Discarding stale diagram result"
            );
            return false;
        }
        if self.state.is_terminal() {
            return false;
        }
        self.finish(completion.result);
        true
    }

    fn finish(&mut self, result: RenderResult) {
        let render_id = self.render_id.as_deref().unwrap_or_default();
        match &result {
            RenderResult::Success(_) => {
                debug!(render_id = render_id, generation = self.generation; "Diagram rendered");
            }
            RenderResult::Failure(message) => {
                error!(
                    render_id = render_id,
                    generation = self.generation;
                    "Diagram rendering failed: {message}"
                );
            }
            RenderResult::Pending => {}
        }
        self.state = result;
        self.task = None;
    }
}

impl Drop for DiagramRenderer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for DiagramRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramRenderer")
            .field("engine", &self.engine.name())
            .field("render_id", &self.render_id)
            .field("generation", &self.generation)
            .field("state", &self.state)
            .field("deferred", &self.deferred)
            .finish()
    }
}

/// A fresh `diagram-` id with nine random base-36 characters.
pub fn new_render_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..RENDER_ID_LEN)
        .map(|_| char::from(RENDER_ID_ALPHABET[rng.random_range(0..RENDER_ID_ALPHABET.len())]))
        .collect();
    format!("{RENDER_ID_PREFIX}{suffix}")
}
