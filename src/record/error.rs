use std::path::PathBuf;

use thiserror::Error;

use super::prompt::PromptError;
use crate::manifest::ManifestError;

/// Failures that stop a command and are shown to the user.
#[derive(Debug, Error)]
pub enum RecordError {
    /// No project directory is open, or it does not exist.
    #[error("Open a project first: {}", describe_project(.path))]
    NoProject { path: Option<PathBuf> },
    #[error("No manifest.json found at {path}; is this an app project?")]
    ManifestMissing { path: PathBuf },
    #[error("No build history found at {path}")]
    HistoryMissing { path: PathBuf },
    /// Manifest could not be read, parsed or rewritten.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

fn describe_project(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!("{} is not a directory", path.display()),
        None => "no project directory given".to_string(),
    }
}
