use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use serde_json::Value;

static VERSION_NAME_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""versionName"\s*:\s*"(?:[^"\\]|\\.)*""#).expect("versionName regex must compile")
});
static VERSION_CODE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""versionCode"\s*:\s*"?\d+"?"#).expect("versionCode regex must compile")
});

/// Replace the first `versionName` and `versionCode` pairs in `text`.
///
/// Each substitution is independent and touches only its first match; a
/// missing field stays missing. `versionName` is written as an escaped JSON
/// string and `versionCode` is always written quoted.
pub fn rewrite_version_fields(text: &str, version_name: &str, version_code: u64) -> String {
    let name_literal = Value::String(version_name.to_string());
    let name_field = format!("\"versionName\": {name_literal}");
    let code_field = format!("\"versionCode\": \"{version_code}\"");
    let renamed = VERSION_NAME_FIELD.replace(text, NoExpand(&name_field));
    VERSION_CODE_FIELD
        .replace(&renamed, NoExpand(&code_field))
        .into_owned()
}
