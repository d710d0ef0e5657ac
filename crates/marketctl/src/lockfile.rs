//! Lock manifest generation and reconciliation against the plugin tree.

use crate::discovery::{find_skills, relative_path};
use crate::provenance;
use crate::walker::WalkError;
use chrono::{DateTime, Utc};
use market_core::rules::short_sha;
use market_core::{LockEntry, LockManifest, ReconciliationIssue, ReconciliationKind};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LockError {
    #[error("{} not found, run generate-lock first", path.display())]
    NotFound { path: PathBuf },
    #[error("cannot read lockfile {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid lockfile JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize lockfile: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Walk(#[from] WalkError),
}

pub type Result<T> = std::result::Result<T, LockError>;

/// How outstanding reconciliation issues affect the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Report issues, still succeed.
    #[default]
    Warn,
    /// Report issues and fail if there are any.
    Strict,
}

/// Outcome of reconciling a lock manifest with the tree.
#[derive(Debug, Clone)]
pub struct LockReport {
    pub issues: Vec<ReconciliationIssue>,
    /// Number of skills found on disk.
    pub tracked: usize,
    pub generated: DateTime<Utc>,
}

impl LockReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }

    /// Whether the run succeeds under `mode`.
    pub fn passes(&self, mode: CheckMode) -> bool {
        match mode {
            CheckMode::Warn => true,
            CheckMode::Strict => self.is_consistent(),
        }
    }

    pub fn count(&self, kind: ReconciliationKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

/// Build a lock manifest for every skill under `plugins_root`.
///
/// Keys are skill paths relative to `root`. A skill is external when a
/// provenance record resolves for it.
pub fn generate_lock(
    root: &Path,
    plugins_root: &Path,
    generated: DateTime<Utc>,
) -> Result<LockManifest> {
    let mut lock = LockManifest::new(generated);
    for skill in find_skills(plugins_root)? {
        let entry = match provenance::resolve(&skill, plugins_root) {
            Some(record) => LockEntry::External {
                origin: record.url,
                sha: record.sha,
            },
            None => LockEntry::Internal,
        };
        lock.skills.insert(relative_path(root, &skill), entry);
    }
    debug!(
        skills = lock.skills.len(),
        external = lock.external_count(),
        "generated lock manifest"
    );
    Ok(lock)
}

/// Overwrite the lock file with `lock`.
pub fn write_lock(path: &Path, lock: &LockManifest) -> Result<()> {
    let content = lock.to_pretty_json()?;
    fs::write(path, content).map_err(|source| LockError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), skills = lock.skills.len(), "wrote lockfile");
    Ok(())
}

/// Read and parse the lock file. A missing file is an error.
pub fn load_lock(path: &Path) -> Result<LockManifest> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LockError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LockError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    LockManifest::parse(&content).map_err(|source| LockError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Compare `lock` with the skills currently on disk.
///
/// Every disagreement is reported: skills missing from the lock first, then
/// locked skills missing on disk, then sha mismatches, each group sorted by
/// path.
pub fn reconcile(lock: &LockManifest, root: &Path, plugins_root: &Path) -> Result<LockReport> {
    let skills = find_skills(plugins_root)?;
    let live: BTreeSet<String> = skills.iter().map(|s| relative_path(root, s)).collect();

    let mut issues: Vec<ReconciliationIssue> = live
        .iter()
        .filter(|path| !lock.skills.contains_key(*path))
        .map(|path| ReconciliationIssue::new(ReconciliationKind::MissingInLock, path.as_str()))
        .collect();

    issues.extend(
        lock.skills
            .keys()
            .filter(|path| !live.contains(*path))
            .map(|path| {
                ReconciliationIssue::new(ReconciliationKind::MissingInPlugins, path.as_str())
            }),
    );

    let mut mismatches = Vec::new();
    for skill in &skills {
        let rel = relative_path(root, skill);
        let Some(locked_sha) = lock.skills.get(&rel).and_then(LockEntry::sha) else {
            continue;
        };
        let Some(record) = provenance::resolve(skill, plugins_root) else {
            continue;
        };
        if record.sha != locked_sha {
            mismatches.push(
                ReconciliationIssue::new(ReconciliationKind::ShaMismatch, rel).with_details(
                    format!(
                        "lockfile: {}, actual: {}",
                        short_sha(locked_sha),
                        short_sha(&record.sha)
                    ),
                ),
            );
        }
    }
    mismatches.sort_by(|a, b| a.path.cmp(&b.path));
    issues.extend(mismatches);

    Ok(LockReport {
        issues,
        tracked: live.len(),
        generated: lock.generated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::types::PROVENANCE_FILE;
    use market_core::ProvenanceRecord;
    use tempfile::TempDir;

    fn write_skill(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("SKILL.md"), "---\nname: x\n---\n").unwrap();
    }

    fn write_record(dir: &Path, sha: &str) {
        let record = ProvenanceRecord::new("https://github.com/acme/tools", sha, Utc::now());
        fs::write(dir.join(PROVENANCE_FILE), record.to_pretty_json().unwrap()).unwrap();
    }

    fn fixture() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let plugins = tmp.path().join("plugins");
        write_skill(&plugins.join("core/skills/review"));
        let vendored = plugins.join("external/acme/tools");
        write_skill(&vendored.join("skills/lint"));
        write_record(&vendored, "1234567890abcdef");
        (tmp, plugins)
    }

    #[test]
    fn generate_classifies_skills() {
        let (tmp, plugins) = fixture();
        let lock = generate_lock(tmp.path(), &plugins, Utc::now()).unwrap();

        assert_eq!(
            lock.skills.get("plugins/core/skills/review"),
            Some(&LockEntry::Internal)
        );
        assert_eq!(
            lock.skills.get("plugins/external/acme/tools/skills/lint"),
            Some(&LockEntry::External {
                origin: "https://github.com/acme/tools".to_string(),
                sha: "1234567890abcdef".to_string(),
            })
        );
        assert_eq!(lock.internal_count(), 1);
        assert_eq!(lock.external_count(), 1);
    }

    #[test]
    fn write_then_load() {
        let (tmp, plugins) = fixture();
        let path = tmp.path().join("marketplace.lock");
        let lock = generate_lock(tmp.path(), &plugins, Utc::now()).unwrap();

        write_lock(&path, &lock).unwrap();
        assert_eq!(load_lock(&path).unwrap(), lock);
    }

    #[test]
    fn load_distinguishes_missing_and_invalid() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("marketplace.lock");
        assert!(matches!(load_lock(&path), Err(LockError::NotFound { .. })));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(load_lock(&path), Err(LockError::Parse { .. })));
    }

    #[test]
    fn reconcile_reports_each_kind() {
        let (tmp, plugins) = fixture();
        let mut lock = generate_lock(tmp.path(), &plugins, Utc::now()).unwrap();

        lock.skills.remove("plugins/core/skills/review");
        lock.skills
            .insert("plugins/core/skills/gone".to_string(), LockEntry::Internal);
        lock.skills.insert(
            "plugins/external/acme/tools/skills/lint".to_string(),
            LockEntry::External {
                origin: "https://github.com/acme/tools".to_string(),
                sha: "fedcba0987654321".to_string(),
            },
        );

        let report = reconcile(&lock, tmp.path(), &plugins).unwrap();
        let kinds: Vec<_> = report.issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ReconciliationKind::MissingInLock,
                ReconciliationKind::MissingInPlugins,
                ReconciliationKind::ShaMismatch,
            ]
        );
        assert_eq!(
            report.issues[2].details.as_deref(),
            Some("lockfile: fedcba0, actual: 1234567")
        );
        assert!(report.passes(CheckMode::Warn));
        assert!(!report.passes(CheckMode::Strict));
    }

    #[test]
    fn external_entry_without_record_is_not_a_mismatch() {
        let (tmp, plugins) = fixture();
        let mut lock = generate_lock(tmp.path(), &plugins, Utc::now()).unwrap();
        lock.skills.insert(
            "plugins/core/skills/review".to_string(),
            LockEntry::External {
                origin: "https://example.com/x".to_string(),
                sha: "abc".to_string(),
            },
        );

        let report = reconcile(&lock, tmp.path(), &plugins).unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.tracked, 2);
    }

    #[test]
    fn broken_inner_record_defers_to_outer_record() {
        let (tmp, plugins) = fixture();
        write_record(&plugins.join("external"), "feedface00");
        fs::write(
            plugins.join("external/acme/tools").join(PROVENANCE_FILE),
            "{ broken",
        )
        .unwrap();

        let lock = generate_lock(tmp.path(), &plugins, Utc::now()).unwrap();
        assert_eq!(
            lock.skills["plugins/external/acme/tools/skills/lint"].sha(),
            Some("feedface00")
        );
    }

    #[test]
    fn missing_plugins_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = generate_lock(tmp.path(), &tmp.path().join("plugins"), Utc::now()).unwrap_err();
        assert!(matches!(err, LockError::Walk(_)));
    }
}
