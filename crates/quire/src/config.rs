//! Configuration types for Quire sites.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file; every section and field is optional.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`SiteConfig`] - Site metadata shown by the page shell.
//! - [`ContentConfig`] - Where content pages are loaded from.
//! - [`DiagramConfig`] - Which engine renders diagram blocks, and how.
//! - [`BuildConfig`] - Where the static build is written.
//!
//! # Example
//!
//! ```
//! # use quire::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.site().title(), "Documentation");
//! assert_eq!(config.diagram().language(), "mermaid");
//! ```

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use quire_diagram::{EngineConfig, Theme};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    site: SiteConfig,

    #[serde(default)]
    content: ContentConfig,

    #[serde(default)]
    diagram: DiagramConfig,

    #[serde(default)]
    build: BuildConfig,
}

impl AppConfig {
    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn content(&self) -> &ContentConfig {
        &self.content
    }

    pub fn diagram(&self) -> &DiagramConfig {
        &self.diagram
    }

    pub fn build(&self) -> &BuildConfig {
        &self.build
    }

    /// Overrides the content directory.
    pub fn with_content_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.content.dir = dir.into();
        self
    }

    /// Overrides the build output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build.output_dir = dir.into();
        self
    }
}

/// Site metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    title: String,
    description: Option<String>,
    nav_title: Option<String>,
    icon: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Documentation".to_string(),
            description: None,
            nav_title: None,
            icon: None,
        }
    }
}

impl SiteConfig {
    /// Creates site metadata with the given title and no other fields.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_nav_title(mut self, nav_title: impl Into<String>) -> Self {
        self.nav_title = Some(nav_title.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Title of the docs navigation bar, falling back to the site title.
    pub fn nav_title(&self) -> &str {
        self.nav_title.as_deref().unwrap_or(&self.title)
    }

    /// URL of the site icon.
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }
}

/// Content loading settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    dir: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("content/docs"),
        }
    }
}

impl ContentConfig {
    /// Directory holding the Markdown content pages.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Which engine renders diagram blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// The native flowchart engine.
    #[default]
    Builtin,
    /// An external renderer program.
    Command,
}

/// Diagram rendering settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    language: String,
    engine: EngineKind,
    command: String,
    theme: Theme,
    timeout_ms: u64,
    client_script: Option<String>,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            language: "mermaid".to_string(),
            engine: EngineKind::default(),
            command: "mmdc".to_string(),
            theme: Theme::default(),
            timeout_ms: 30_000,
            client_script: None,
        }
    }
}

impl DiagramConfig {
    /// Fenced code block language routed to the diagram renderer.
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    /// Program run by the command engine.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Upper bound on one diagram render; `timeout_ms = 0` disables it.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Script loaded by pages whose diagrams are left to the browser.
    pub fn client_script(&self) -> Option<&str> {
        self.client_script.as_deref()
    }

    /// Settings for the native engine.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default().with_theme(self.theme)
    }
}

/// Static build settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    output_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("out"),
        }
    }
}

impl BuildConfig {
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
