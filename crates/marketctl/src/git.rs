//! Git access for vendoring.
//!
//! Fetching goes through the `Fetcher` trait so vendoring can run against a
//! local fake in tests; `GitFetcher` shells out to `git`.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

static HTTPS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^/]+/([^/]+)/([^/.]+)").expect("https url pattern compiles")
});

static SSH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"git@[^:]+:([^/]+)/([^/.]+)").expect("ssh url pattern compiles")
});

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git command failed: {0}")]
    CommandFailed(String),
    #[error("failed to execute git: {0}")]
    Execution(#[from] std::io::Error),
    #[error("invalid utf-8 in git output")]
    InvalidUtf8,
    #[error("invalid repository URL: {0}")]
    InvalidRepoUrl(String),
}

pub type Result<T> = std::result::Result<T, GitError>;

/// `org/repo` pair identifying an upstream repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub org: String,
    pub repo: String,
}

/// Extract `org/repo` from an https or ssh repository URL.
///
/// A trailing `.git` is dropped.
pub fn parse_repo_url(url: &str) -> Result<RepoId> {
    HTTPS_URL
        .captures(url)
        .or_else(|| SSH_URL.captures(url))
        .map(|caps| RepoId {
            org: caps[1].to_string(),
            repo: caps[2].to_string(),
        })
        .ok_or_else(|| GitError::InvalidRepoUrl(url.to_string()))
}

/// Something that can produce a checkout of a repository.
pub trait Fetcher {
    /// Materialize the current head of `url` at `dest` and return its commit
    /// sha. `dest` must not exist yet.
    fn fetch(&self, url: &str, dest: &Path) -> Result<String>;
}

/// Fetches with a shallow `git clone`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitFetcher;

impl Fetcher for GitFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<String> {
        debug!(url, dest = %dest.display(), "cloning repository");
        let output = Command::new("git")
            .args(["clone", "--depth", "1", url])
            .arg(dest)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CommandFailed(format!(
                "git clone {}: {}",
                url,
                stderr.trim()
            )));
        }

        head_sha(dest)
    }
}

/// Commit sha of `HEAD` in `repo`.
pub fn head_sha(repo: &Path) -> Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(repo)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::CommandFailed(format!(
            "git rev-parse HEAD: {}",
            stderr.trim()
        )));
    }

    let sha = String::from_utf8(output.stdout).map_err(|_| GitError::InvalidUtf8)?;
    Ok(sha.trim().to_string())
}

/// Top level of the git checkout containing the current directory.
pub fn toplevel() -> Option<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!path.is_empty()).then(|| PathBuf::from(path))
}
