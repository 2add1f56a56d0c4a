//! Where buildstamp keeps files that belong to the installation rather than
//! to a project.
//!
//! `settings.toml` and `logs/` live in a `.buildstamp` folder under the OS
//! config directory (e.g. `%APPDATA%` on Windows). Setting
//! `BUILDSTAMP_CONFIG_HOME` replaces the OS directory.

use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

/// Folder created under the config root.
pub const APP_DIR_NAME: &str = ".buildstamp";
/// Environment variable that relocates the config root.
pub const CONFIG_HOME_ENV: &str = "BUILDSTAMP_CONFIG_HOME";
const LOGS_DIR_NAME: &str = "logs";

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No config directory found; set {CONFIG_HOME_ENV} to choose one")]
    NoBaseDir,
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The `.buildstamp` folder, created on first use.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(config_base_dir()?.join(APP_DIR_NAME))
}

/// The `logs/` folder inside [`app_root_dir`], created on first use.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join(LOGS_DIR_NAME))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    match std::fs::create_dir_all(&path) {
        Ok(()) => Ok(path),
        Err(source) => Err(AppDirError::CreateDir { path, source }),
    }
}

fn config_base_dir() -> Result<PathBuf, AppDirError> {
    if let Some(path) = test_support::override_dir() {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(CONFIG_HOME_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(AppDirError::NoBaseDir)
}

#[cfg(test)]
pub(crate) use test_support::ConfigBaseGuard;

#[cfg(not(test))]
mod test_support {
    use std::path::PathBuf;

    pub(super) fn override_dir() -> Option<PathBuf> {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn root_and_logs_live_under_the_override() {
        let base = tempdir().unwrap();
        let _guard = ConfigBaseGuard::set(base.path().to_path_buf());

        let root = app_root_dir().unwrap();
        assert_eq!(root, base.path().join(APP_DIR_NAME));
        let logs = logs_dir().unwrap();
        assert_eq!(logs, root.join("logs"));
        assert!(logs.is_dir());
    }

    #[test]
    fn a_file_in_the_way_is_reported() {
        let base = tempdir().unwrap();
        std::fs::write(base.path().join(APP_DIR_NAME), "not a dir").unwrap();
        let _guard = ConfigBaseGuard::set(base.path().to_path_buf());

        let err = app_root_dir().unwrap_err();
        assert!(matches!(err, AppDirError::CreateDir { path, .. } if path == base.path().join(APP_DIR_NAME)));
    }
}
