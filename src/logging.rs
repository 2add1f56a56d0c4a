//! Tracing setup for the `buildstamp` binary.
//!
//! Each run writes everything the `RUST_LOG` filter allows (default `info`)
//! to its own `buildstamp_<timestamp>.log` under the app's `logs/` folder.
//! Only warnings reach stderr so prompts stay readable. The newest
//! [`MAX_LOG_FILES`] files are kept.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};

use time::{
    OffsetDateTime, UtcOffset,
    format_description::{BorrowedFormatItem, FormatItem},
    macros::format_description,
};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Layer, Registry, filter::LevelFilter, fmt, prelude::*};

use crate::app_dirs::{self, AppDirError};

/// Log files kept on disk, counting the current run's.
pub const MAX_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "buildstamp";
const LOG_EXTENSION: &str = "log";
const DEFAULT_FILTER: &str = "info";

const FILE_NAME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Log directory unavailable: {0}")]
    Dir(#[from] AppDirError),
    #[error("Failed to format log filename time: {0}")]
    FormatTime(#[from] time::error::Format),
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber and return this run's log file.
///
/// `started` names the file and fixes the UTC offset of every log line, so
/// capture it before any thread is spawned. Later calls do nothing and
/// return `None`.
pub fn init(started: OffsetDateTime) -> Result<Option<PathBuf>, LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(None);
    }

    let log_dir = app_dirs::logs_dir()?;
    let file_name = log_file_name(started)?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(rolling::never(&log_dir, &file_name));
    let timer = log_timer(started.offset());

    let stderr_layer = fmt::layer()
        .with_timer(timer.clone())
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::WARN);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(file_writer);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing::subscriber::set_global_default(
        Registry::default().with(filter).with(stderr_layer).with(file_layer),
    )?;
    let _ = LOG_GUARD.set(guard);

    let log_path = log_dir.join(&file_name);
    tracing::info!("Logging to {}", log_path.display());
    let removed = prune_old_logs(&log_dir, &file_name, MAX_LOG_FILES - 1);
    if removed > 0 {
        tracing::debug!("Removed {removed} old log files");
    }
    Ok(Some(log_path))
}

fn log_file_name(started: OffsetDateTime) -> Result<String, LoggingError> {
    let stamp = started.format(FILE_NAME_FORMAT)?;
    Ok(format!("{LOG_FILE_PREFIX}_{stamp}.{LOG_EXTENSION}"))
}

fn log_timer(offset: UtcOffset) -> fmt::time::OffsetTime<BorrowedFormatItem<'static>> {
    fmt::time::OffsetTime::new(offset, TIMESTAMP_FORMAT.into())
}

/// Delete all but the `keep` newest `.log` files in `dir`, never touching
/// `current`. Returns how many were removed; failures are logged.
fn prune_old_logs(dir: &Path, current: &str, keep: usize) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!("Failed to list log directory {}: {err}", dir.display());
            return 0;
        }
    };
    let mut logs: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == LOG_EXTENSION))
        .filter(|path| path.file_name().is_some_and(|name| name != current))
        .map(|path| {
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();

    logs.sort_by(|a, b| b.0.cmp(&a.0));
    let mut removed = 0;
    for (_, path) in logs.into_iter().skip(keep) {
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(err) => tracing::warn!("Failed to remove old log {}: {err}", path.display()),
        }
    }
    removed
}
