//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use quire::{QuireError, config::AppConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration `{path}`: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for QuireError {
    fn from(err: ConfigError) -> Self {
        QuireError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (quire/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, QuireError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path:? = path; "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("quire/config.toml");
    if local_config.exists() {
        info!(path:? = local_config; "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("dev", "quire", "quire") {
        let system_config = proj_dirs.config_dir().join("config.toml");
        if system_config.exists() {
            info!(path:? = system_config; "Loading configuration from system path");
            return load_config_file(&system_config);
        }
        debug!(path:? = system_config; "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: &Path) -> Result<AppConfig, QuireError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path).map_err(|err| QuireError::io(path, err))?;
    parse_config(path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<AppConfig, QuireError> {
    let config = toml::from_str(content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(config)
}
