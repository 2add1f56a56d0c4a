use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment regex must compile"));
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//.*").expect("line comment regex must compile"));

/// Turns JSON-like text that may carry comments into a JSON value.
pub trait LenientParser {
    fn parse(&self, text: &str) -> Result<Value, serde_json::Error>;
}

/// Strips `/* */` and `//` comments with regexes, then parses strict JSON.
///
/// Comment markers inside string literals (for example URLs) are stripped too,
/// so values such as `"https://host"` end up truncated.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentStripper;

impl CommentStripper {
    /// The text that [`LenientParser::parse`] hands to `serde_json`.
    pub fn strip(text: &str) -> String {
        let without_blocks = BLOCK_COMMENT.replace_all(text, "");
        LINE_COMMENT.replace_all(&without_blocks, "").into_owned()
    }
}

impl LenientParser for CommentStripper {
    fn parse(&self, text: &str) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&Self::strip(text))
    }
}
