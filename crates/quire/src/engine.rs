//! Diagram engine selection and the external command engine.

use std::{
    fs::{self, File},
    io,
    process::{Child, Command, ExitStatus, Stdio},
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use log::{debug, info};

use quire_diagram::{DiagramEngine, FlowchartEngine, RenderError};

use crate::config::{DiagramConfig, EngineKind};

/// Renders diagrams by running an external renderer such as the Mermaid
/// CLI (`mmdc -i <input> -o <output.svg>`).
///
/// The program sees the definition in a temporary directory that is
/// removed after each render. With a timeout set, a program still running
/// when it expires is killed.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    timeout: Option<Duration>,
}

/// Interval between exit checks of a running renderer.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

impl CommandEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kills the program if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Waits for `child`, killing it once the timeout expires.
    fn wait(&self, mut child: Child) -> Result<ExitStatus, RenderError> {
        let wait_error =
            |err: io::Error| RenderError::Engine(format!("failed to wait for `{}`: {err}", self.program));

        let Some(timeout) = self.timeout else {
            return child.wait().map_err(wait_error);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(wait_error)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                // The child may exit between the check and the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Err(RenderError::Engine(format!(
                    "`{}` killed after {} ms",
                    self.program,
                    timeout.as_millis()
                )));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl DiagramEngine for CommandEngine {
    fn render(&self, id: &str, definition: &str) -> Result<String, RenderError> {
        let workdir = tempfile::tempdir()
            .map_err(|err| RenderError::Engine(format!("failed to create work directory: {err}")))?;
        let input = workdir.path().join(format!("{id}.mmd"));
        let output = workdir.path().join(format!("{id}.svg"));
        let stderr_path = workdir.path().join(format!("{id}.stderr"));

        fs::write(&input, definition)
            .map_err(|err| RenderError::Engine(format!("failed to write diagram input: {err}")))?;
        let stderr = File::create(&stderr_path)
            .map_err(|err| RenderError::Engine(format!("failed to capture renderer output: {err}")))?;

        debug!(program = self.program.as_str(), id = id; "Running diagram renderer");
        let child = Command::new(&self.program)
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|err| RenderError::Engine(format!("failed to run `{}`: {err}", self.program)))?;

        let status = self.wait(child)?;
        if !status.success() {
            let stderr = fs::read_to_string(&stderr_path).unwrap_or_default();
            return Err(RenderError::Engine(format!(
                "`{}` exited with {}: {}",
                self.program,
                status,
                stderr.trim()
            )));
        }

        fs::read_to_string(&output)
            .map_err(|err| RenderError::Engine(format!("failed to read rendered diagram: {err}")))
    }

    fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Creates the engine selected by `config`.
///
/// Selecting the built-in engine installs its process-wide settings from
/// `config`; if settings were already installed they are kept.
pub fn engine_from_config(config: &DiagramConfig) -> Arc<dyn DiagramEngine> {
    match config.engine() {
        EngineKind::Builtin => {
            quire_diagram::config::initialize(config.engine_config());
            Arc::new(FlowchartEngine::new())
        }
        EngineKind::Command => {
            let engine = CommandEngine::new(config.command()).with_timeout(config.timeout());
            info!(
                program = engine.program(),
                available = engine.is_available();
                "Using external diagram renderer"
            );
            Arc::new(engine)
        }
    }
}
