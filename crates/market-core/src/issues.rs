//! Findings produced by validation and lock reconciliation.
//!
//! A run creates one `IssueCollector` and threads it by `&mut` through every
//! check. Issues are only ever appended, in the order the checks ran.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A structural rule violation at a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: PathBuf,
    pub message: String,
}

/// Ordered, append-only collection of validation issues for one run.
#[derive(Debug, Default)]
pub struct IssueCollector {
    issues: Vec<ValidationIssue>,
}

/// Position in an `IssueCollector`, used to look at what a check added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

impl IssueCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl AsRef<Path>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        });
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.issues.len())
    }

    /// Issues appended after the checkpoint was taken.
    pub fn since(&self, checkpoint: Checkpoint) -> &[ValidationIssue] {
        &self.issues[checkpoint.0.min(self.issues.len())..]
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationIssue> {
        self.issues.iter()
    }

    pub fn into_vec(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

impl<'a> IntoIterator for &'a IssueCollector {
    type Item = &'a ValidationIssue;
    type IntoIter = std::slice::Iter<'a, ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Kind of disagreement between the lock manifest and the plugin tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationKind {
    /// Skill exists on disk but has no lock entry.
    MissingInLock,
    /// Lock entry has no skill on disk.
    MissingInPlugins,
    /// Provenance sha differs from the locked sha.
    ShaMismatch,
}

impl ReconciliationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingInLock => "missing_in_lock",
            Self::MissingInPlugins => "missing_in_plugins",
            Self::ShaMismatch => "sha_mismatch",
        }
    }
}

/// One lock/tree disagreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationIssue {
    pub kind: ReconciliationKind,
    /// Skill path relative to the repository root.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ReconciliationIssue {
    pub fn new(kind: ReconciliationKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
