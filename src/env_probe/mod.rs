//! Best-effort detection of the tool versions recorded with each build.
//!
//! Process-wide state is captured once into an [`EnvSnapshot`] and passed in,
//! so tests can describe a fake machine. No lookup here ever fails the
//! caller: problems are logged and a sentinel string is returned instead.

mod registry;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde_json::Value;
use thiserror::Error;

use crate::settings::ToolSettings;

pub use registry::{RegistryLookup, SystemRegistry};

/// Recorded when neither the host nor the settings name an IDE version.
pub const IDE_VERSION_UNKNOWN: &str = "unknown";
/// Recorded when the companion tool could not be found.
pub const DEVTOOL_NOT_DETECTED: &str = "not detected";
/// Builder name used when no user-name variable is set.
pub const UNKNOWN_USER: &str = "unknown user";
/// Environment variable a host uses to hand over its own version.
pub const IDE_VERSION_ENV: &str = "BUILDSTAMP_IDE_VERSION";

/// Install folder name of the WeChat DevTools on Windows.
const WECHAT_DEVTOOLS_DIR: &str = "微信web开发者工具";
const WECHAT_DEVTOOLS_MAC_RESOURCES: &str =
    "/Applications/wechatwebdevtools.app/Contents/Resources";

/// Errors from a single probe step. Never escapes this module's public API.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid package descriptor {path}: {source}")]
    Descriptor {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Registry lookup of {key} failed: {source}")]
    Registry {
        key: String,
        source: std::io::Error,
    },
}

/// Operating system family the probe runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl Platform {
    /// Platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }
}

/// Read-only view of the process environment.
#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    pub platform: Platform,
    pub vars: BTreeMap<String, String>,
    /// Version reported by the host IDE, if any.
    pub ide_version: Option<String>,
}

impl EnvSnapshot {
    /// Capture the real process environment. Variables that are not valid
    /// UTF-8 are skipped.
    pub fn capture() -> Self {
        let vars: BTreeMap<String, String> = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        let ide_version = vars.get(IDE_VERSION_ENV).cloned();
        Self {
            platform: Platform::current(),
            vars,
            ide_version,
        }
    }

    /// An empty environment for `platform`.
    pub fn empty(platform: Platform) -> Self {
        Self {
            platform,
            vars: BTreeMap::new(),
            ide_version: None,
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_ide_version(mut self, version: impl Into<String>) -> Self {
        self.ide_version = Some(version.into());
        self
    }

    /// Non-empty value of `key`.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// The pair of versions stored in every build record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVersions {
    pub ide: String,
    pub dev_tool: String,
}

/// Where to look for the companion developer tool.
#[derive(Debug, Clone)]
pub struct DevToolProbe {
    /// Install folder name under the Windows program directories.
    pub dir_name: String,
    /// Directories tried before the built-in candidates.
    pub extra_dirs: Vec<PathBuf>,
    /// Descriptor path relative to an install directory.
    pub descriptor: PathBuf,
    /// Registry key under `HKEY_CURRENT_USER` holding the install directory.
    pub registry_key: String,
    pub registry_value: String,
}

impl Default for DevToolProbe {
    fn default() -> Self {
        Self {
            dir_name: WECHAT_DEVTOOLS_DIR.to_string(),
            extra_dirs: Vec::new(),
            descriptor: Path::new("package.nw").join("package.json"),
            registry_key: format!("Software\\Tencent\\{WECHAT_DEVTOOLS_DIR}"),
            registry_value: "InstallDir".to_string(),
        }
    }
}

impl DevToolProbe {
    /// Default probe plus the directories configured in `settings`.
    pub fn from_settings(settings: &ToolSettings) -> Self {
        Self {
            extra_dirs: settings.devtool_dirs.clone(),
            ..Self::default()
        }
    }

    /// Install directories to check, in order.
    pub fn candidate_dirs(&self, env: &EnvSnapshot) -> Vec<PathBuf> {
        let mut dirs = self.extra_dirs.clone();
        match env.platform {
            Platform::Windows => {
                for (var, fallback) in [
                    ("ProgramFiles(x86)", "C:\\Program Files (x86)"),
                    ("ProgramFiles", "C:\\Program Files"),
                ] {
                    let root = env.var(var).unwrap_or(fallback);
                    dirs.push(PathBuf::from(root).join("Tencent").join(&self.dir_name));
                }
                if let Some(local) = env.var("LOCALAPPDATA") {
                    dirs.push(PathBuf::from(local).join("Programs").join(&self.dir_name));
                }
                if let Some(profile) = env.var("USERPROFILE") {
                    dirs.push(
                        PathBuf::from(profile)
                            .join("AppData")
                            .join("Local")
                            .join("Programs")
                            .join(&self.dir_name),
                    );
                }
            }
            Platform::MacOs => dirs.push(PathBuf::from(WECHAT_DEVTOOLS_MAC_RESOURCES)),
            Platform::Linux | Platform::Other => {}
        }
        let mut seen = std::collections::BTreeSet::new();
        dirs.retain(|dir| seen.insert(dir.clone()));
        dirs
    }

    fn version_in(&self, dir: &Path) -> Option<String> {
        let path = dir.join(&self.descriptor);
        if !path.is_file() {
            return None;
        }
        match read_descriptor_version(&path) {
            Ok(Some(version)) => {
                tracing::info!("Found dev tool version {version} at {}", path.display());
                Some(version)
            }
            Ok(None) => {
                tracing::debug!("{} has no version field", path.display());
                None
            }
            Err(err) => {
                tracing::warn!("{err}");
                None
            }
        }
    }
}

/// Read the non-empty `version` string from a package descriptor.
pub fn read_descriptor_version(path: &Path) -> Result<Option<String>, ProbeError> {
    let text = std::fs::read_to_string(path).map_err(|source| ProbeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|source| ProbeError::Descriptor {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(value
        .get("version")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .map(str::to_string))
}

/// Host-reported IDE version, else the configured fallback, else `unknown`.
pub fn ide_version(env: &EnvSnapshot, settings: &ToolSettings) -> String {
    env.ide_version
        .as_deref()
        .or(settings.ide_version.as_deref())
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .unwrap_or(IDE_VERSION_UNKNOWN)
        .to_string()
}

/// Installed companion-tool version, or `not detected`.
///
/// Install directories are tried first. The registry is consulted only when
/// the snapshot describes a Windows machine.
pub fn devtool_version(
    env: &EnvSnapshot,
    probe: &DevToolProbe,
    registry: &dyn RegistryLookup,
) -> String {
    for dir in probe.candidate_dirs(env) {
        if let Some(version) = probe.version_in(&dir) {
            return version;
        }
    }

    if env.platform == Platform::Windows {
        match registry.read_string(&probe.registry_key, &probe.registry_value) {
            Ok(Some(install_dir)) => {
                let install_dir = install_dir.trim();
                if !install_dir.is_empty()
                    && let Some(version) = probe.version_in(Path::new(install_dir))
                {
                    return version;
                }
            }
            Ok(None) => tracing::debug!("No registry entry for {}", probe.registry_key),
            Err(err) => tracing::warn!("{err}"),
        }
    }

    tracing::info!("Dev tool not detected");
    DEVTOOL_NOT_DETECTED.to_string()
}

/// Probe both recorded versions.
pub fn probe_tools(
    env: &EnvSnapshot,
    settings: &ToolSettings,
    registry: &dyn RegistryLookup,
) -> ToolVersions {
    ToolVersions {
        ide: ide_version(env, settings),
        dev_tool: devtool_version(env, &DevToolProbe::from_settings(settings), registry),
    }
}

/// Login name of the current user, or `unknown user`.
pub fn system_username(env: &EnvSnapshot) -> String {
    env.var("USERNAME")
        .or_else(|| env.var("USER"))
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_USER.to_string())
}
