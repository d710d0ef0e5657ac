//! Recursive directory classifier shared by every discovery operation.
//!
//! Walks a root depth-first and returns the directories that satisfy a marker
//! predicate. Hidden directories are skipped, matched directories are not
//! descended into, and unreadable subdirectories contribute nothing. Only an
//! unreadable root is an error.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("cannot read directory {}: {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, WalkError>;

/// Find every directory under `root` for which `is_marker` returns true.
///
/// The root itself is never tested. Results are in walk order; entries within a
/// directory are visited sorted by name so repeated walks agree.
pub fn find_marked_dirs<F>(root: &Path, is_marker: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let entries = read_sorted(root).map_err(|source| WalkError::DirectoryRead {
        path: root.to_path_buf(),
        source,
    })?;

    let mut visited = HashSet::new();
    if let Ok(canonical) = root.canonicalize() {
        visited.insert(canonical);
    }

    let mut found = Vec::new();
    walk_entries(entries, &is_marker, &mut visited, &mut found);
    Ok(found)
}

fn walk_entries<F>(
    entries: Vec<PathBuf>,
    is_marker: &F,
    visited: &mut HashSet<PathBuf>,
    found: &mut Vec<PathBuf>,
) where
    F: Fn(&Path) -> bool,
{
    for path in entries {
        if is_hidden(&path) || !path.is_dir() {
            continue;
        }

        // Symlinked directories can point back up the tree.
        match path.canonicalize() {
            Ok(canonical) => {
                if !visited.insert(canonical) {
                    debug!(path = %path.display(), "directory already visited, skipping");
                    continue;
                }
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot resolve directory, skipping");
                continue;
            }
        }

        if is_marker(&path) {
            found.push(path);
            continue;
        }

        match read_sorted(&path) {
            Ok(children) => walk_entries(children, is_marker, visited, found),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read directory, skipping");
            }
        }
    }
}

fn read_sorted(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}

/// Whether the final path component starts with a dot.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}
