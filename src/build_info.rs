//! The per-invocation build event record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use crate::env_probe::ToolVersions;

/// Placeholder stored when a probe produced no text at all.
pub const MISSING_VALUE: &str = "-";
/// Notes recorded when the user left the notes prompt empty.
pub const DEFAULT_NOTES: &str = "Routine build";

const DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Snapshot of one recorded build.
///
/// Every field defaults on deserialize so partial entries written by older
/// versions still load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildInfo {
    /// Local time of the build at minute resolution (`YYYY-MM-DD HH:MM`).
    pub date: String,
    pub version_name: String,
    /// Stringified integer. Hand-edited entries may carry a bare number.
    #[serde(deserialize_with = "string_or_number")]
    pub version_code: String,
    pub ide_version: String,
    pub dev_tool_version: String,
    pub builder: String,
    pub notes: String,
}

impl BuildInfo {
    /// Assemble a record, substituting the `-` placeholder for empty probe
    /// results. `notes` is stored as given; see [`resolve_notes`].
    pub fn new(
        now: OffsetDateTime,
        version_name: impl Into<String>,
        version_code: u64,
        tools: &ToolVersions,
        builder: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            date: format_build_date(now),
            version_name: version_name.into(),
            version_code: version_code.to_string(),
            ide_version: or_placeholder(&tools.ide, MISSING_VALUE),
            dev_tool_version: or_placeholder(&tools.dev_tool, MISSING_VALUE),
            builder: builder.into(),
            notes: notes.into(),
        }
    }
}

/// Trimmed user notes, or `fallback` when nothing was entered.
pub fn resolve_notes(notes: &str, fallback: &str) -> String {
    or_placeholder(notes, fallback)
}

/// Render `now` as `YYYY-MM-DD HH:MM`.
pub fn format_build_date(now: OffsetDateTime) -> String {
    now.format(DATE_FORMAT).unwrap_or_else(|_| {
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}",
            now.year(),
            u8::from(now.month()),
            now.day(),
            now.hour(),
            now.minute()
        )
    })
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn date_has_minute_resolution() {
        let now = datetime!(2024-01-15 14:30:59 UTC);
        assert_eq!(format_build_date(now), "2024-01-15 14:30");
    }

    #[test]
    fn empty_fields_get_placeholders() {
        let tools = ToolVersions {
            ide: String::new(),
            dev_tool: "  ".into(),
        };
        let info = BuildInfo::new(
            datetime!(2024-01-15 14:30 UTC),
            "1.0.1",
            101,
            &tools,
            "dana",
            resolve_notes("", DEFAULT_NOTES),
        );
        assert_eq!(info.version_code, "101");
        assert_eq!(info.ide_version, MISSING_VALUE);
        assert_eq!(info.dev_tool_version, MISSING_VALUE);
        assert_eq!(info.notes, DEFAULT_NOTES);
        assert_eq!(resolve_notes("  fixed login ", DEFAULT_NOTES), "fixed login");
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let info = BuildInfo {
            version_name: "1.0.0".into(),
            ..BuildInfo::default()
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["versionName"], "1.0.0");
        assert!(value.get("devToolVersion").is_some());
    }

    #[test]
    fn partial_entries_deserialize_with_defaults() {
        let info: BuildInfo = serde_json::from_str(r#"{"versionName":"2.0.0"}"#).unwrap();
        assert_eq!(info.version_name, "2.0.0");
        assert!(info.date.is_empty());
    }

    #[test]
    fn numeric_version_code_reads_as_text() {
        let info: BuildInfo =
            serde_json::from_str(r#"{"versionName":"1.0.1","versionCode":101}"#).unwrap();
        assert_eq!(info.version_code, "101");
        let info: BuildInfo = serde_json::from_str(r#"{"versionCode":null}"#).unwrap();
        assert!(info.version_code.is_empty());
    }
}
