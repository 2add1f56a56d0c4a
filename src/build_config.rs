//! Per-project user preferences stored in `.build-config.json`.
//!
//! The store is a flat JSON object. Saves merge over what is on disk so keys
//! written by other versions of the tool survive. Nothing here returns an
//! error: a broken file reads as empty and a failed save is logged.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::fs_ops;

/// Config filename inside the project directory.
pub const BUILD_CONFIG_FILE_NAME: &str = ".build-config.json";
const BUILDER_NAME_KEY: &str = "builderName";

/// Key/value preferences; `builderName` is the only key the tool interprets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildConfig {
    entries: Map<String, Value>,
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A partial config carrying only the builder name.
    pub fn with_builder_name(name: impl Into<String>) -> Self {
        let mut config = Self::new();
        config.insert(BUILDER_NAME_KEY, Value::String(name.into()));
        config
    }

    /// Saved builder name, if present and non-empty.
    pub fn builder_name(&self) -> Option<&str> {
        self.entries
            .get(BUILDER_NAME_KEY)
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shallow merge: keys in `other` overwrite same-named keys here.
    pub fn merge(&mut self, other: &BuildConfig) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }
}

/// Path of the config store inside `project_dir`.
pub fn config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(BUILD_CONFIG_FILE_NAME)
}

/// Load the config store, returning an empty config on any failure.
pub fn load(project_dir: &Path) -> BuildConfig {
    load_from(&config_path(project_dir))
}

/// Merge `partial` over the stored config and write the result back.
pub fn save(project_dir: &Path, partial: &BuildConfig) {
    save_to(&config_path(project_dir), partial);
}

pub(crate) fn load_from(path: &Path) -> BuildConfig {
    if !path.exists() {
        return BuildConfig::default();
    }
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!("Failed to read build config {}: {err}", path.display());
            return BuildConfig::default();
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(entries)) => BuildConfig { entries },
        Ok(_) => {
            tracing::warn!(
                "Build config {} is not a JSON object; ignoring it",
                path.display()
            );
            BuildConfig::default()
        }
        Err(err) => {
            tracing::warn!("Invalid build config {}: {err}", path.display());
            BuildConfig::default()
        }
    }
}

pub(crate) fn save_to(path: &Path, partial: &BuildConfig) {
    let mut merged = load_from(path);
    merged.merge(partial);
    let data = match merged.to_pretty_json() {
        Ok(data) => data,
        Err(err) => {
            tracing::error!("Failed to serialize build config: {err}");
            return;
        }
    };
    match fs_ops::atomic_write(path, data.as_bytes()) {
        Ok(()) => tracing::debug!("Saved build config to {}", path.display()),
        Err(err) => tracing::error!("Failed to save build config {}: {err}", path.display()),
    }
}
