//! Reading and in-place rewriting of the project manifest.
//!
//! Reads go through a [`LenientParser`] because manifests carry comments.
//! Writes never serialize the parsed value: they patch the original text so
//! comments and formatting survive.

mod lenient;
mod rewrite;

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::fs_ops;
use crate::version::leading_number;

pub use lenient::{CommentStripper, LenientParser};
pub use rewrite::rewrite_version_fields;

/// Manifest filename inside the project directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";
/// `versionName` used when the manifest has none.
pub const DEFAULT_VERSION_NAME: &str = "1.0.0";
/// `versionCode` used when the manifest has none or it is not numeric.
pub const DEFAULT_VERSION_CODE: u64 = 100;

/// Errors raised while reading or updating the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to update {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Version fields extracted from a manifest, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestVersion {
    pub version_name: String,
    pub version_code: u64,
}

impl ManifestVersion {
    /// Extract version fields from a parsed manifest value.
    pub fn from_value(value: &Value) -> Self {
        let version_name = value
            .get("versionName")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_VERSION_NAME)
            .to_string();
        let version_code = value
            .get("versionCode")
            .and_then(parse_version_code)
            .unwrap_or(DEFAULT_VERSION_CODE);
        Self {
            version_name,
            version_code,
        }
    }
}

fn parse_version_code(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(text) => leading_number(text),
        _ => None,
    }
}

/// Path of the manifest inside `project_dir`.
pub fn manifest_path(project_dir: &Path) -> PathBuf {
    project_dir.join(MANIFEST_FILE_NAME)
}

/// Read and parse the manifest at `path`.
pub fn read_manifest(
    path: &Path,
    parser: &dyn LenientParser,
) -> Result<ManifestVersion, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value = parser.parse(&text).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ManifestVersion::from_value(&value))
}

/// Rewrite the `versionName`/`versionCode` values of the manifest file in place.
pub fn write_version_fields(
    path: &Path,
    version_name: &str,
    version_code: u64,
) -> Result<(), ManifestError> {
    let write_error = |source| ManifestError::Write {
        path: path.to_path_buf(),
        source,
    };
    let text = std::fs::read_to_string(path).map_err(write_error)?;
    let updated = rewrite_version_fields(&text, version_name, version_code);
    fs_ops::atomic_write(path, updated.as_bytes()).map_err(write_error)?;
    tracing::info!(
        "Manifest {} updated to {version_name} ({version_code})",
        path.display()
    );
    Ok(())
}
