//! Provenance record lookup.
//!
//! A vendored plugin carries a `.source.json` at (or above) its skill
//! directories. Provenance is optional metadata: the resolver never fails, and
//! a malformed record reads as "no record".

use crate::walker::{self, find_marked_dirs};
use market_core::types::{ProvenanceRecord, PROVENANCE_FILE};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ProvenanceError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid provenance record {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load the provenance record in `dir`.
///
/// `Ok(None)` means there is no record; `Err` means there is one but it cannot
/// be read or parsed.
pub fn load_record(dir: &Path) -> Result<Option<ProvenanceRecord>, ProvenanceError> {
    read_record(&dir.join(PROVENANCE_FILE))
}

/// Load a provenance record from an explicit file path.
pub fn read_record(path: &Path) -> Result<Option<ProvenanceRecord>, ProvenanceError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ProvenanceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| ProvenanceError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Resolve the provenance record nearest to `skill_path`.
///
/// Walks from `skill_path` up to and including `plugins_root` and returns the
/// first record that loads. Unreadable or malformed records are passed over
/// as if absent.
pub fn resolve(skill_path: &Path, plugins_root: &Path) -> Option<ProvenanceRecord> {
    skill_path
        .ancestors()
        .take_while(|dir| dir.starts_with(plugins_root))
        .find_map(|dir| match load_record(dir) {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "ignoring unusable provenance record");
                None
            }
        })
}

/// Find every directory under `root` that holds a provenance record.
///
/// A missing root yields an empty list; an unreadable one is an error.
pub fn find_records(root: &Path) -> walker::Result<Vec<PathBuf>> {
    if !root.exists() {
        warn!(path = %root.display(), "external directory not found");
        return Ok(Vec::new());
    }
    find_marked_dirs(root, |dir| dir.join(PROVENANCE_FILE).is_file())
}
