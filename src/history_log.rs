//! Human-readable build changelog kept as a markdown table.
//!
//! New rows go directly under the example row so the newest build is always
//! at the top of the table. Existing rows are never touched.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::build_info::BuildInfo;
use crate::fs_ops;

/// History log filename inside the project directory.
pub const HISTORY_FILE_NAME: &str = "BUILD_HISTORY.md";
/// Text that marks the template row new entries are inserted after.
pub const EXAMPLE_ROW_MARKER: &str = "Example:";

const TEMPLATE: &str = "# Build Version History

This file records every packaged build of the app: version numbers, tool \
versions and who built it. Use it to track releases and to reproduce issues.

## Builds

| Build date | versionName | versionCode | IDE version | DevTools version | Builder | Notes |
|------------|-------------|-------------|-------------|------------------|---------|-------|
| Example: 2024-01-15 14:30 | 1.0.0 | 100 | 3.8.12 | 1.06.2401010 | Jane Doe | Initial release |

## Usage

Run `buildstamp record` (or the IDE command \"Record build version\") after \
packaging a build. `buildstamp history` opens this file.

## Version numbers

- **versionName**: semantic version (major.minor.patch)
- **versionCode**: integer incremented on every build, used for comparisons

## Detected automatically

- **IDE version**: reported by the host IDE
- **DevTools version**: read from the companion tool's install directory
";

/// Errors raised while creating or updating the history log.
#[derive(Debug, Error)]
pub enum HistoryLogError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Path of the history log inside `project_dir`.
pub fn history_path(project_dir: &Path) -> PathBuf {
    project_dir.join(HISTORY_FILE_NAME)
}

/// Create the log from the template if it does not exist yet.
pub fn ensure_initialized(path: &Path) -> Result<(), HistoryLogError> {
    if path.exists() {
        return Ok(());
    }
    fs_ops::atomic_write(path, TEMPLATE.as_bytes()).map_err(|source| HistoryLogError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Created build history at {}", path.display());
    Ok(())
}

/// Insert a row for `info` below the example row, or at the end of the file
/// when no example row exists.
pub fn append_row(path: &Path, info: &BuildInfo) -> Result<(), HistoryLogError> {
    let content = std::fs::read_to_string(path).map_err(|source| HistoryLogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let updated = insert_row(&content, &format_row(info));
    fs_ops::atomic_write(path, updated.as_bytes()).map_err(|source| HistoryLogError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Render `info` as a markdown table row in the fixed column order.
pub fn format_row(info: &BuildInfo) -> String {
    let cells = [
        &info.date,
        &info.version_name,
        &info.version_code,
        &info.ide_version,
        &info.dev_tool_version,
        &info.builder,
        &info.notes,
    ];
    let mut row = String::from("|");
    for cell in cells {
        row.push(' ');
        row.push_str(&escape_cell(cell));
        row.push_str(" |");
    }
    row
}

fn insert_row(content: &str, row: &str) -> String {
    let mut lines: Vec<&str> = content.split('\n').collect();
    match lines
        .iter()
        .position(|line| line.contains(EXAMPLE_ROW_MARKER))
    {
        Some(index) => {
            let row = if lines[index].ends_with('\r') {
                format!("{row}\r")
            } else {
                row.to_string()
            };
            lines.insert(index + 1, &row);
            lines.join("\n")
        }
        None if content.contains("\r\n") => format!("{content}\r\n{row}"),
        None => format!("{content}\n{row}"),
    }
}

fn escape_cell(value: &str) -> String {
    value.replace('\n', " ").replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn info(version: &str, code: &str) -> BuildInfo {
        BuildInfo {
            date: "2024-03-01 09:15".into(),
            version_name: version.into(),
            version_code: code.into(),
            ide_version: "4.0.1".into(),
            dev_tool_version: "1.06.2402040".into(),
            builder: "ana".into(),
            notes: "hotfix".into(),
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .split('\n')
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn row_uses_fixed_column_order() {
        assert_eq!(
            format_row(&info("1.0.1", "101")),
            "| 2024-03-01 09:15 | 1.0.1 | 101 | 4.0.1 | 1.06.2402040 | ana | hotfix |"
        );
    }

    #[test]
    fn pipes_in_cells_are_escaped() {
        let mut entry = info("1.0.1", "101");
        entry.notes = "a|b".into();
        assert!(format_row(&entry).ends_with("| a\\|b |"));
    }

    #[test]
    fn initialization_does_not_overwrite_existing_log() {
        let dir = tempdir().unwrap();
        let path = history_path(dir.path());
        std::fs::write(&path, "custom").unwrap();
        ensure_initialized(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "custom");
    }

    #[test]
    fn newest_rows_sit_directly_below_the_example_row() {
        let dir = tempdir().unwrap();
        let path = history_path(dir.path());
        ensure_initialized(&path).unwrap();

        append_row(&path, &info("1.0.1", "101")).unwrap();
        append_row(&path, &info("1.0.2", "102")).unwrap();

        let lines = lines(&path);
        let example = lines
            .iter()
            .position(|line| line.contains(EXAMPLE_ROW_MARKER))
            .unwrap();
        assert_eq!(lines[example + 1], format_row(&info("1.0.2", "102")));
        assert_eq!(lines[example + 2], format_row(&info("1.0.1", "101")));
        assert!(lines[example + 3].is_empty());
    }

    #[test]
    fn appends_at_end_without_example_row() {
        let dir = tempdir().unwrap();
        let path = history_path(dir.path());
        std::fs::write(&path, "| a | b |").unwrap();

        append_row(&path, &info("1.0.1", "101")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("| a | b |\n{}", format_row(&info("1.0.1", "101"))));
    }

    #[test]
    fn crlf_logs_keep_their_line_endings() {
        let dir = tempdir().unwrap();
        let path = history_path(dir.path());
        std::fs::write(&path, TEMPLATE.replace('\n', "\r\n")).unwrap();

        append_row(&path, &info("1.0.1", "101")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(&format!("{}\r\n", format_row(&info("1.0.1", "101")))));
        assert_eq!(text.matches('\n').count(), text.matches("\r\n").count());
    }

    #[test]
    fn crlf_log_without_example_row_appends_with_crlf() {
        let dir = tempdir().unwrap();
        let path = history_path(dir.path());
        std::fs::write(&path, "| a | b |\r\n| c | d |").unwrap();

        append_row(&path, &info("1.0.1", "101")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            format!("| a | b |\r\n| c | d |\r\n{}", format_row(&info("1.0.1", "101")))
        );
    }

    #[test]
    fn append_to_missing_log_is_a_read_error() {
        let dir = tempdir().unwrap();
        let err = append_row(&history_path(dir.path()), &info("1.0.1", "101")).unwrap_err();
        assert!(matches!(err, HistoryLogError::Read { .. }));
    }
}
