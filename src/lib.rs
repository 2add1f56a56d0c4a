//! Build-version bookkeeping for app projects.
//!
//! Bumps the version in `manifest.json`, appends to `BUILD_HISTORY.md` and
//! keeps a JSON journal of recent builds, tagging each build with detected
//! tool versions.

/// Installation directory for settings and logs.
pub mod app_dirs;
/// Per-project user preferences.
pub mod build_config;
/// The recorded build event.
pub mod build_info;
/// Tool version detection.
pub mod env_probe;
mod fs_ops;
/// Markdown build changelog.
pub mod history_log;
/// JSON journal of recent builds.
pub mod journal;
/// Tracing setup for the binary.
pub mod logging;
/// Manifest reading and rewriting.
pub mod manifest;
/// The record and view-history commands.
pub mod record;
/// Installation-scoped tool settings.
pub mod settings;
/// Version bump arithmetic.
pub mod version;
