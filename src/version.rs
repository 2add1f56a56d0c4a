//! Version-string arithmetic for manifest bumps.
//!
//! Parsing is deliberately forgiving: manifests in the wild carry values such
//! as `1.2`, `2.0.0-beta` or plain garbage, and a bump must still produce a
//! usable three-part version instead of failing the recording flow.

use std::{fmt, str::FromStr};

/// Which version component a bump increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BumpKind {
    /// Increment the first component and reset the rest.
    Major,
    /// Increment the second component and reset the third.
    Minor,
    /// Increment the third component.
    #[default]
    Patch,
}

impl BumpKind {
    /// Lowercase label used in prompts and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            other => Err(format!("Unknown bump kind '{other}'")),
        }
    }
}

/// Bump `version` by `kind`, always returning a `X.Y.Z` string.
///
/// Components are read from their leading digits; anything non-numeric or
/// missing counts as 0 and components past the third are dropped.
pub fn bump(version: &str, kind: BumpKind) -> String {
    let mut parts = [0u64; 3];
    for (slot, raw) in parts.iter_mut().zip(version.split('.')) {
        *slot = leading_number(raw).unwrap_or(0);
    }
    match kind {
        BumpKind::Major => {
            parts[0] = parts[0].saturating_add(1);
            parts[1] = 0;
            parts[2] = 0;
        }
        BumpKind::Minor => {
            parts[1] = parts[1].saturating_add(1);
            parts[2] = 0;
        }
        BumpKind::Patch => {
            parts[2] = parts[2].saturating_add(1);
        }
    }
    format!("{}.{}.{}", parts[0], parts[1], parts[2])
}

/// Whether `version` is a strict SemVer 2.0 string.
pub fn is_semver(version: &str) -> bool {
    semver::Version::parse(version.trim()).is_ok()
}

/// Parse the run of ASCII digits at the start of `raw`, ignoring leading
/// whitespace. Returns `None` when there are no digits.
pub(crate) fn leading_number(raw: &str) -> Option<u64> {
    let trimmed = raw.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map(|(idx, _)| idx)
        .unwrap_or(trimmed.len());
    if end == 0 {
        return None;
    }
    Some(trimmed[..end].parse::<u64>().unwrap_or(u64::MAX))
}
