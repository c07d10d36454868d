//! Root configuration structure and file loading.

use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::backdrop::BackdropConfig;
use super::overlay::OverlayConfig;
use super::panel::PanelConfig;
use crate::constants::APP_NAME;

/// Root configuration structure for Frost.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FrostConfig {
    /// Blurred backdrop pipeline configuration.
    pub backdrop: BackdropConfig,

    /// Brightness-adaptive scrim overlay configuration.
    pub overlay: OverlayConfig,

    /// Panel geometry configuration.
    pub panel: PanelConfig,
}

/// Errors that can occur when loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. Expected at ~/.config/frost/config.jsonc, \
        the platform config directory, or ~/.frost.jsonc"
    )]
    NotFound,
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Legacy configuration file names in the home directory.
const LEGACY_CONFIG_FILE_NAMES: &[&str] = &[".frost.jsonc", ".frost.json"];

/// Returns the possible configuration file paths in priority order.
///
/// The function checks the following locations (both `.jsonc` and `.json`
/// variants):
/// 1. `$XDG_CONFIG_HOME/frost/` when the variable is set
/// 2. `~/.config/frost/`
/// 3. the platform config directory
/// 4. `~/.frost.jsonc` or `~/.frost.json` (legacy/simple location)
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let app_dir = PathBuf::from(xdg_config).join(APP_NAME);
        for filename in CONFIG_FILE_NAMES {
            paths.push(app_dir.join(filename));
        }
    }

    if let Some(home) = dirs::home_dir() {
        let app_dir = home.join(".config").join(APP_NAME);
        for filename in CONFIG_FILE_NAMES {
            let path = app_dir.join(filename);
            // XDG_CONFIG_HOME might already be ~/.config
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let app_dir = config_dir.join(APP_NAME);
        for filename in CONFIG_FILE_NAMES {
            let path = app_dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Some(home) = dirs::home_dir() {
        for filename in LEGACY_CONFIG_FILE_NAMES {
            paths.push(home.join(filename));
        }
    }

    paths
}

/// Loads the configuration from the first available config file.
///
/// The configuration file supports JSONC format (JSON with comments).
/// Both single-line (`//`) and multi-line (`/* */`) comments are stripped
/// before parsing.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists in any
/// of the expected locations, `ConfigError::Io` if a file could not be
/// read, and `ConfigError::Parse` if it contains invalid JSON.
pub fn load_config() -> Result<(FrostConfig, PathBuf), ConfigError> {
    for path in config_paths() {
        if path.exists() {
            return load_config_from_path(&path);
        }
    }

    Err(ConfigError::NotFound)
}

/// Loads the configuration from a specific path.
///
/// # Errors
///
/// Returns `ConfigError::Io` if the file could not be read and
/// `ConfigError::Parse` if it contains invalid JSON.
pub fn load_config_from_path(path: &Path) -> Result<(FrostConfig, PathBuf), ConfigError> {
    let file = fs::File::open(path)?;
    // Strip comments from JSONC before parsing
    let reader = json_comments::StripComments::new(file);
    let config: FrostConfig = serde_json::from_reader(reader)?;
    Ok((config, path.to_path_buf()))
}
