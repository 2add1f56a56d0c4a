//! Installation-scoped tool settings stored as TOML in the app directory.
//!
//! Every field is optional; a missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;

/// Settings filename inside the `.buildstamp` directory.
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Errors that may occur while loading tool settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("No suitable config directory found")]
    NoConfigDir,
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid settings at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// User-tunable behavior shared by every project on this machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// IDE version to record when the host does not report one.
    pub ide_version: Option<String>,
    /// Companion-tool install directories probed before the built-in list.
    pub devtool_dirs: Vec<PathBuf>,
    /// Notes recorded when the user enters none.
    pub default_notes: Option<String>,
}

impl ToolSettings {
    /// Drop blank strings so they behave like unset values.
    fn normalized(mut self) -> Self {
        self.ide_version = self.ide_version.filter(|value| !value.trim().is_empty());
        self.default_notes = self.default_notes.filter(|value| !value.trim().is_empty());
        self.devtool_dirs.retain(|dir| !dir.as_os_str().is_empty());
        self
    }
}

/// Resolve the settings file path, ensuring the parent directory exists.
pub fn settings_path() -> Result<PathBuf, SettingsError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(SETTINGS_FILE_NAME))
}

/// Load settings from the app directory, returning defaults if missing.
pub fn load_or_default() -> Result<ToolSettings, SettingsError> {
    load_from(&settings_path()?)
}

/// Load settings from `path`, returning defaults if the file is missing.
pub fn load_from(path: &Path) -> Result<ToolSettings, SettingsError> {
    if !path.exists() {
        return Ok(ToolSettings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<ToolSettings>(&text)
        .map(ToolSettings::normalized)
        .map_err(|source| SettingsError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> SettingsError {
    match error {
        app_dirs::AppDirError::NoBaseDir => SettingsError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            SettingsError::CreateDir { path, source }
        }
    }
}
