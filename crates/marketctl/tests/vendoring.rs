//! Vendoring against a local fake upstream.

use chrono::{TimeZone, Utc};
use market_core::types::PROVENANCE_FILE;
use marketctl::git::{self, Fetcher, GitError};
use marketctl::provenance::load_record;
use marketctl::vendor::{add_external, copy_into, sync_external, AddRequest, SyncStatus};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Upstream repositories backed by local directories.
#[derive(Default)]
struct FakeUpstream {
    repos: HashMap<String, (PathBuf, String)>,
    fetched: RefCell<Vec<String>>,
}

impl FakeUpstream {
    fn serve(&mut self, url: &str, tree: &Path, sha: &str) {
        self.repos
            .insert(url.to_string(), (tree.to_path_buf(), sha.to_string()));
    }
}

impl Fetcher for FakeUpstream {
    fn fetch(&self, url: &str, dest: &Path) -> git::Result<String> {
        self.fetched.borrow_mut().push(url.to_string());
        let (tree, sha) = self
            .repos
            .get(url)
            .ok_or_else(|| GitError::CommandFailed(format!("git clone {url}: not found")))?;
        copy_into(tree, dest).map_err(GitError::Execution)?;
        Ok(sha.clone())
    }
}

fn write_skill(tree: &Path, rel: &str, body: &str) {
    let dir = tree.join(rel);
    fs::create_dir_all(&dir).unwrap();
    let name = rel.rsplit('/').next().unwrap();
    fs::write(
        dir.join("SKILL.md"),
        format!("---\nname: {name}\ndescription: d\nversion: 1.0.0\n---\n\n{body}\n"),
    )
    .unwrap();
}

fn skill_body(external: &Path, rel: &str) -> String {
    fs::read_to_string(external.join(rel).join("SKILL.md")).unwrap()
}

const ACME: &str = "https://github.com/acme/tools";
const OTHER: &str = "git@github.com:other/kit.git";

struct Setup {
    external: TempDir,
    acme_tree: TempDir,
    other_tree: TempDir,
    upstream: FakeUpstream,
}

/// Vendor one skill from each of two upstreams at their first revision.
fn setup() -> Setup {
    let external = TempDir::new().unwrap();
    let acme_tree = TempDir::new().unwrap();
    let other_tree = TempDir::new().unwrap();
    write_skill(acme_tree.path(), "skills/lint", "v1");
    write_skill(other_tree.path(), "skills/fmt", "v1");

    let mut upstream = FakeUpstream::default();
    upstream.serve(ACME, acme_tree.path(), "aaaaaaa1");
    upstream.serve(OTHER, other_tree.path(), "bbbbbbb1");

    let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for (url, path) in [(ACME, "skills/lint"), (OTHER, "skills/fmt")] {
        let request = AddRequest {
            url,
            path_in_repo: path,
            name: None,
        };
        add_external(&upstream, external.path(), &request, first).unwrap();
    }

    Setup {
        external,
        acme_tree,
        other_tree,
        upstream,
    }
}

#[test]
fn add_merges_paths_across_invocations() {
    let s = setup();
    write_skill(s.acme_tree.path(), "skills/review", "v1");

    let request = AddRequest {
        url: ACME,
        path_in_repo: "skills/review",
        name: None,
    };
    add_external(&s.upstream, s.external.path(), &request, Utc::now()).unwrap();
    add_external(&s.upstream, s.external.path(), &request, Utc::now()).unwrap();

    let record = load_record(&s.external.path().join("acme/tools")).unwrap().unwrap();
    assert_eq!(record.paths, vec!["skills/lint", "skills/review"]);
    assert!(s.external.path().join("other/kit").join(PROVENANCE_FILE).is_file());
}

#[test]
fn sync_reports_up_to_date_sources() {
    let s = setup();
    let report = sync_external(&s.upstream, s.external.path(), false, Utc::now()).unwrap();

    assert_eq!(report.results.len(), 2);
    assert!(report
        .results
        .iter()
        .all(|r| r.status == SyncStatus::UpToDate));
    assert_eq!(report.summary().to_string(), "0 updated, 2 up-to-date, 0 failed");
}

#[test]
fn dry_run_does_not_mutate() {
    let mut s = setup();
    write_skill(s.acme_tree.path(), "skills/lint", "v2");
    s.upstream.serve(ACME, s.acme_tree.path(), "aaaaaaa2");
    let record_path = s.external.path().join("acme/tools").join(PROVENANCE_FILE);
    let before = fs::read_to_string(&record_path).unwrap();

    let report = sync_external(&s.upstream, s.external.path(), true, Utc::now()).unwrap();

    let acme = report
        .results
        .iter()
        .find(|r| r.source_dir.ends_with("acme/tools"))
        .unwrap();
    assert_eq!(
        acme.status,
        SyncStatus::WouldUpdate {
            new_sha: "aaaaaaa2".to_string()
        }
    );
    assert_eq!(fs::read_to_string(&record_path).unwrap(), before);
    assert!(skill_body(s.external.path(), "acme/tools/skills/lint").contains("v1"));
}

#[test]
fn sync_replaces_content_and_rewrites_record() {
    let mut s = setup();
    write_skill(s.acme_tree.path(), "skills/lint", "v2");
    fs::write(
        s.external.path().join("acme/tools/skills/lint/local-only.md"),
        "stale",
    )
    .unwrap();
    s.upstream.serve(ACME, s.acme_tree.path(), "aaaaaaa2");
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

    let report = sync_external(&s.upstream, s.external.path(), false, now).unwrap();
    assert_eq!(report.summary().updated, 1);

    assert!(skill_body(s.external.path(), "acme/tools/skills/lint").contains("v2"));
    assert!(!s
        .external
        .path()
        .join("acme/tools/skills/lint/local-only.md")
        .exists());

    let record = load_record(&s.external.path().join("acme/tools")).unwrap().unwrap();
    assert_eq!(record.sha, "aaaaaaa2");
    assert_eq!(record.synced_at, Some(now));
    assert_eq!(record.paths, vec!["skills/lint"]);
}

#[test]
fn sync_refreshes_custom_named_skill_in_place() {
    let external = TempDir::new().unwrap();
    let tree = TempDir::new().unwrap();
    write_skill(tree.path(), "skills/lint", "v1");
    let mut upstream = FakeUpstream::default();
    upstream.serve(ACME, tree.path(), "aaaaaaa1");

    let request = AddRequest {
        url: ACME,
        path_in_repo: "skills/lint",
        name: Some("acme-lint"),
    };
    add_external(&upstream, external.path(), &request, Utc::now()).unwrap();

    write_skill(tree.path(), "skills/lint", "v2");
    upstream.serve(ACME, tree.path(), "aaaaaaa2");
    let report = sync_external(&upstream, external.path(), false, Utc::now()).unwrap();
    assert_eq!(report.summary().updated, 1);

    assert!(skill_body(external.path(), "acme/tools/skills/acme-lint").contains("v2"));
    assert!(!external.path().join("acme/tools/skills/lint").exists());
}

#[test]
fn one_failing_source_does_not_halt_the_rest() {
    let mut s = setup();
    // Upstream for acme disappears; other moves forward.
    s.upstream.repos.remove(ACME);
    write_skill(s.other_tree.path(), "skills/fmt", "v2");
    s.upstream.serve(OTHER, s.other_tree.path(), "bbbbbbb2");

    let report = sync_external(&s.upstream, s.external.path(), false, Utc::now()).unwrap();

    assert_eq!(report.summary().to_string(), "1 updated, 0 up-to-date, 1 failed");
    assert_eq!(s.upstream.fetched.borrow().len(), 4);
    assert!(skill_body(s.external.path(), "other/kit/skills/fmt").contains("v2"));
    assert!(skill_body(s.external.path(), "acme/tools/skills/lint").contains("v1"));
}

#[test]
fn tracked_path_gone_upstream_fails_that_source_only() {
    let mut s = setup();
    fs::remove_dir_all(s.acme_tree.path().join("skills/lint")).unwrap();
    write_skill(s.acme_tree.path(), "skills/other", "v2");
    s.upstream.serve(ACME, s.acme_tree.path(), "aaaaaaa2");

    let report = sync_external(&s.upstream, s.external.path(), false, Utc::now()).unwrap();

    let acme = report
        .results
        .iter()
        .find(|r| r.source_dir.ends_with("acme/tools"))
        .unwrap();
    assert!(matches!(acme.status, SyncStatus::Failed { .. }));
    let record = load_record(&s.external.path().join("acme/tools")).unwrap().unwrap();
    assert_eq!(record.sha, "aaaaaaa1");
    assert!(skill_body(s.external.path(), "acme/tools/skills/lint").contains("v1"));
}

#[test]
fn malformed_record_is_reported_as_failed() {
    let s = setup();
    fs::write(
        s.external.path().join("acme/tools").join(PROVENANCE_FILE),
        "{ broken",
    )
    .unwrap();

    let report = sync_external(&s.upstream, s.external.path(), false, Utc::now()).unwrap();
    let summary = report.summary();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.up_to_date, 1);
}

#[test]
fn missing_external_root_has_nothing_to_sync() {
    let tmp = TempDir::new().unwrap();
    let upstream = FakeUpstream::default();

    let report = sync_external(&upstream, &tmp.path().join("external"), false, Utc::now()).unwrap();
    assert!(report.results.is_empty());
}
