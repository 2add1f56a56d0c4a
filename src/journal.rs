//! Structured build journal kept in `.build-version.json`.
//!
//! Holds the latest build plus a rolling, most-recent-first history capped at
//! [`HISTORY_LIMIT`] entries. Earlier entries are kept as raw JSON and written
//! back untouched, whatever fields they carry. Reads never fail: missing or
//! corrupt journals read as empty and the problem is logged.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::build_info::BuildInfo;
use crate::fs_ops;

/// Journal filename inside the project directory.
pub const JOURNAL_FILE_NAME: &str = ".build-version.json";
/// Maximum number of prior builds kept in `history`.
pub const HISTORY_LIMIT: usize = 20;

const LAST_BUILD_KEY: &str = "lastBuild";
const HISTORY_KEY: &str = "history";

/// On-disk journal layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    pub last_build: Option<Value>,
    pub history: Vec<Value>,
    /// Top-level keys this tool does not manage.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Journal {
    /// Build a journal from parsed JSON, keeping whatever entries it holds.
    ///
    /// A non-object `lastBuild` is dropped and a non-array `history` reads
    /// as empty.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        let last_build = match map.remove(LAST_BUILD_KEY) {
            Some(entry @ Value::Object(_)) => Some(entry),
            _ => None,
        };
        let history = match map.remove(HISTORY_KEY) {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        };
        Self {
            last_build,
            history,
            extra: map,
        }
    }

    /// Make `entry` the latest build, rotating the previous one into history.
    ///
    /// A previous entry without a date is discarded rather than rotated.
    pub fn push(&mut self, entry: Value) {
        if let Some(previous) = self.last_build.take()
            && entry_has_date(&previous)
        {
            self.history.insert(0, previous);
        }
        self.history.truncate(HISTORY_LIMIT);
        self.last_build = Some(entry);
    }

    /// The latest build, if it reads as a [`BuildInfo`].
    pub fn last_build_info(&self) -> Option<BuildInfo> {
        self.last_build.as_ref().and_then(entry_info)
    }

    /// Prior builds that read as [`BuildInfo`], newest first.
    pub fn history_infos(&self) -> Vec<BuildInfo> {
        self.history.iter().filter_map(entry_info).collect()
    }
}

fn entry_has_date(entry: &Value) -> bool {
    entry
        .get("date")
        .and_then(Value::as_str)
        .is_some_and(|date| !date.is_empty())
}

fn entry_info(entry: &Value) -> Option<BuildInfo> {
    BuildInfo::deserialize(entry).ok()
}

/// Errors raised while writing the journal.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Failed to serialize build journal: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Path of the journal inside `project_dir`.
pub fn journal_path(project_dir: &Path) -> PathBuf {
    project_dir.join(JOURNAL_FILE_NAME)
}

/// Read the whole journal, defaulting to an empty one on any failure.
pub fn read(path: &Path) -> Journal {
    if !path.exists() {
        return Journal::default();
    }
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!("Failed to read build journal {}: {err}", path.display());
            return Journal::default();
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(value @ Value::Object(_)) => Journal::from_value(value),
        Ok(_) => {
            tracing::warn!("Build journal {} is not a JSON object", path.display());
            Journal::default()
        }
        Err(err) => {
            tracing::warn!("Invalid build journal {}: {err}", path.display());
            Journal::default()
        }
    }
}

/// The most recent build, if the journal has one.
pub fn load(path: &Path) -> Option<BuildInfo> {
    read(path).last_build_info()
}

/// Record `info` as the latest build and persist the journal.
pub fn record(path: &Path, info: BuildInfo) -> Result<(), JournalError> {
    let mut journal = read(path);
    journal.push(serde_json::to_value(&info)?);
    let data = serde_json::to_string_pretty(&journal)?;
    fs_ops::atomic_write(path, data.as_bytes()).map_err(|source| JournalError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        "Build journal {} now holds {} prior builds",
        path.display(),
        journal.history.len()
    );
    Ok(())
}
