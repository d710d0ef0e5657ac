//! Lock manifest (`marketplace.lock`) format.
//!
//! The lock maps every skill path (relative to the repository root) to either
//! the string `"internal"` or the `{origin, sha}` of the vendored source it
//! came from. It is always regenerated wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current lock format version.
pub const LOCK_FORMAT_VERSION: u32 = 1;

const INTERNAL_MARKER: &str = "internal";

/// Persisted lock manifest.
///
/// `skills` is a `BTreeMap` so keys are always written in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockManifest {
    pub version: u32,
    pub generated: DateTime<Utc>,
    pub skills: BTreeMap<String, LockEntry>,
}

impl LockManifest {
    pub fn new(generated: DateTime<Utc>) -> Self {
        Self {
            version: LOCK_FORMAT_VERSION,
            generated,
            skills: BTreeMap::new(),
        }
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Serialize as pretty JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    pub fn internal_count(&self) -> usize {
        self.skills
            .values()
            .filter(|e| matches!(e, LockEntry::Internal))
            .count()
    }

    pub fn external_count(&self) -> usize {
        self.skills.len() - self.internal_count()
    }
}

/// Lock entry for one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLockEntry", into = "RawLockEntry")]
pub enum LockEntry {
    /// Skill authored in this repository.
    Internal,
    /// Skill vendored from an upstream repository.
    External { origin: String, sha: String },
}

impl LockEntry {
    pub fn sha(&self) -> Option<&str> {
        match self {
            Self::Internal => None,
            Self::External { sha, .. } => Some(sha),
        }
    }
}

/// Wire shape: either the bare marker string or an object.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawLockEntry {
    Marker(String),
    External { origin: String, sha: String },
}

impl TryFrom<RawLockEntry> for LockEntry {
    type Error = String;

    fn try_from(raw: RawLockEntry) -> Result<Self, Self::Error> {
        match raw {
            RawLockEntry::Marker(marker) if marker == INTERNAL_MARKER => Ok(Self::Internal),
            RawLockEntry::Marker(other) => Err(format!(
                "unknown lock entry marker '{other}', expected '{INTERNAL_MARKER}'"
            )),
            RawLockEntry::External { origin, sha } => Ok(Self::External { origin, sha }),
        }
    }
}

impl From<LockEntry> for RawLockEntry {
    fn from(entry: LockEntry) -> Self {
        match entry {
            LockEntry::Internal => Self::Marker(INTERNAL_MARKER.to_string()),
            LockEntry::External { origin, sha } => Self::External { origin, sha },
        }
    }
}
