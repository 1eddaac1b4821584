//! Process-wide engine configuration.
//!
//! The configuration is installed once with [`initialize`]. The first call
//! wins; every later call is a no-op that returns `false`. Reading the
//! configuration with [`config`] before any call installs the default.
//!
//! # Example
//!
//! ```
//! # use quire_diagram::config::{self, EngineConfig, Theme};
//! config::initialize(EngineConfig::default().with_theme(Theme::Forest));
//! // The configuration is now fixed for the lifetime of the process.
//! assert!(!config::initialize(EngineConfig::default()));
//! ```

use std::sync::OnceLock;

use log::{debug, info};
use serde::Deserialize;

static ENGINE_CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Colour theme applied to rendered diagrams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Default,
    #[default]
    Neutral,
    Dark,
    Forest,
}

impl Theme {
    /// Returns the colours used by this theme.
    pub fn palette(self) -> Palette {
        match self {
            Theme::Default => Palette {
                background: "white",
                node_fill: "#ECECFF",
                node_stroke: "#9370DB",
                text: "#333333",
                edge: "#333333",
                label_background: "#E8E8E8",
            },
            Theme::Neutral => Palette {
                background: "white",
                node_fill: "#EEEEEE",
                node_stroke: "#999999",
                text: "#333333",
                edge: "#666666",
                label_background: "white",
            },
            Theme::Dark => Palette {
                background: "#1F2020",
                node_fill: "#1F2020",
                node_stroke: "#81B1DB",
                text: "#CCCCCC",
                edge: "#D3D3D3",
                label_background: "#585858",
            },
            Theme::Forest => Palette {
                background: "white",
                node_fill: "#CDE498",
                node_stroke: "#13540C",
                text: "#000000",
                edge: "#000000",
                label_background: "#E8E8E8",
            },
        }
    }
}

/// SVG colour values for one [`Theme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub node_fill: &'static str,
    pub node_stroke: &'static str,
    pub text: &'static str,
    pub edge: &'static str,
    pub label_background: &'static str,
}

/// Rendering settings shared by every [`FlowchartEngine`](crate::FlowchartEngine).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    theme: Theme,
    font_family: String,
    font_size: f32,
    node_spacing: f32,
    rank_spacing: f32,
    padding: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font_family: "trebuchet ms, verdana, arial, sans-serif".to_string(),
            font_size: 16.0,
            node_spacing: 50.0,
            rank_spacing: 50.0,
            padding: 8.0,
        }
    }
}

impl EngineConfig {
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, size: f32) -> Self {
        self.font_family = family.into();
        self.font_size = size;
        self
    }

    /// Sets the gap between nodes of one rank and the gap between ranks.
    pub fn with_spacing(mut self, node_spacing: f32, rank_spacing: f32) -> Self {
        self.node_spacing = node_spacing;
        self.rank_spacing = rank_spacing;
        self
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Height of one label line.
    pub fn line_height(&self) -> f32 {
        self.font_size * 1.5
    }

    pub fn node_spacing(&self) -> f32 {
        self.node_spacing
    }

    pub fn rank_spacing(&self) -> f32 {
        self.rank_spacing
    }

    /// Margin around the whole drawing.
    pub fn padding(&self) -> f32 {
        self.padding
    }
}

/// Installs the process-wide configuration.
///
/// Returns `true` if this call installed `config`, `false` if a
/// configuration was already in place (the argument is then dropped).
pub fn initialize(config: EngineConfig) -> bool {
    let mut installed = false;
    let active = ENGINE_CONFIG.get_or_init(|| {
        installed = true;
        config
    });

    if installed {
        info!(theme:? = active.theme(), font_size = active.font_size(); "Diagram engine initialized");
    } else {
        debug!("Diagram engine already initialized, keeping existing configuration");
    }
    installed
}

/// Returns the process-wide configuration, installing the default if
/// [`initialize`] was never called.
pub fn config() -> &'static EngineConfig {
    ENGINE_CONFIG.get_or_init(EngineConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.theme(), Theme::Neutral);
        assert_eq!(config.font_size(), 16.0);
        assert_eq!(config.line_height(), 24.0);
    }

    #[test]
    fn test_later_initialize_is_noop() {
        let current = config().clone();
        let other = EngineConfig::default()
            .with_theme(Theme::Dark)
            .with_font("monospace", 99.0);

        assert!(!initialize(other));
        assert_eq!(config(), &current);
    }

    #[test]
    fn test_theme_names() {
        use serde::de::{
            IntoDeserializer,
            value::{Error, StrDeserializer},
        };

        let forest: StrDeserializer<'_, Error> = "forest".into_deserializer();
        assert_eq!(Theme::deserialize(forest).unwrap(), Theme::Forest);

        let unknown: StrDeserializer<'_, Error> = "solarized".into_deserializer();
        assert!(Theme::deserialize(unknown).is_err());
    }

    #[test]
    fn test_palettes_differ() {
        assert_ne!(Theme::Dark.palette(), Theme::Neutral.palette());
        assert_eq!(Theme::Forest.palette().node_stroke, "#13540C");
    }
}
