//! Console output for marketctl.
//!
//! Paths are shown relative to the repository root.

use crate::discovery::relative_path;
use crate::index::IndexBuild;
use crate::lockfile::{CheckMode, LockReport};
use crate::validate::ValidationReport;
use crate::vendor::{AddOutcome, SyncReport, SyncStatus};
use market_core::rules::short_sha;
use market_core::{LockEntry, LockManifest, ReconciliationIssue, ReconciliationKind};
use std::path::Path;

pub fn print_validation_start(count: usize) {
    println!("Validating {count} plugin(s)...");
    println!();
}

/// One line per plugin; `external_sha` marks vendored plugins.
pub fn print_plugin_outcome(root: &Path, path: &Path, valid: bool, external_sha: Option<&str>) {
    let mark = if valid { "✓" } else { "✗" };
    match external_sha {
        Some(sha) => println!(
            "{mark} {} (external @ {})",
            relative_path(root, path),
            short_sha(sha)
        ),
        None => println!("{mark} {}", relative_path(root, path)),
    }
}

pub fn print_validation_summary(root: &Path, report: &ValidationReport) {
    println!();
    if !report.issues.is_empty() {
        println!("Errors:");
        println!();
        for issue in &report.issues {
            println!("  {}: {}", relative_path(root, &issue.path), issue.message);
        }
        println!();
    }
    println!(
        "{}/{} plugins valid",
        report.valid_count(),
        report.plugins.len()
    );
}

pub fn print_lock_generated(lock: &LockManifest, lock_path: &Path, root: &Path) {
    println!("Found {} skill(s)", lock.skills.len());
    println!();
    for (path, entry) in &lock.skills {
        match entry {
            LockEntry::Internal => println!("  {path} (internal)"),
            LockEntry::External { sha, .. } => {
                println!("  {path} (external: {})", short_sha(sha));
            }
        }
    }
    println!();
    println!("✓ Generated {}", relative_path(root, lock_path));
    println!(
        "  {} internal, {} external",
        lock.internal_count(),
        lock.external_count()
    );
}

fn describe(issue: &ReconciliationIssue) -> String {
    match issue.kind {
        ReconciliationKind::MissingInLock => "not in lockfile (run generate-lock)".to_string(),
        ReconciliationKind::MissingInPlugins => "in lockfile but skill not found".to_string(),
        ReconciliationKind::ShaMismatch => format!(
            "SHA mismatch ({})",
            issue.details.as_deref().unwrap_or("unknown")
        ),
    }
}

pub fn print_lock_report(report: &LockReport, mode: CheckMode) {
    if report.is_consistent() {
        println!("✓ Lockfile is consistent");
        println!("  {} skill(s) tracked", report.tracked);
        println!("  Generated: {}", report.generated.to_rfc3339());
        return;
    }

    println!("Found {} issue(s):", report.issues.len());
    println!();
    let icon = match mode {
        CheckMode::Strict => "✗",
        CheckMode::Warn => "⚠",
    };
    for issue in &report.issues {
        println!("{icon} {}: {}", issue.path, describe(issue));
    }
    println!();
    match mode {
        CheckMode::Strict => println!(
            "{} error(s) found. Run generate-lock to update.",
            report.issues.len()
        ),
        CheckMode::Warn => println!(
            "{} warning(s). Use --strict to enforce.",
            report.issues.len()
        ),
    }
}

pub fn print_index(build: &IndexBuild, index_path: &Path, root: &Path) {
    println!("Found {} plugin(s)", build.discovered);
    println!();
    for skipped in &build.skipped {
        println!(
            "⚠ Skipping {}: {}",
            relative_path(root, &skipped.path),
            skipped.reason
        );
    }
    for plugin in &build.plugins {
        println!("✓ {} ({})", plugin.name, plugin.source);
    }
    println!();
    println!(
        "Updated {} with {} plugin(s)",
        relative_path(root, index_path),
        build.plugins.len()
    );
}

pub fn print_added(outcome: &AddOutcome, root: &Path) {
    println!(
        "✓ Added external skill: {}/{}/{}",
        outcome.repo.org, outcome.repo.repo, outcome.skill_name
    );
    println!("  Path:   {}", relative_path(root, &outcome.skill_dir));
    println!("  Source: {}", outcome.record.url);
    println!("  SHA:    {}", short_sha(&outcome.record.sha));
    println!("  Files:  {}", outcome.files);
    println!();
    println!("Run generate-lock to update the lockfile.");
}

pub fn print_sync(report: &SyncReport, root: &Path) {
    if report.results.is_empty() {
        println!("No external skills found");
        return;
    }

    for result in &report.results {
        println!("{}", relative_path(root, &result.source_dir));
        if let Some(record) = &result.record {
            println!("  Source:      {}", record.url);
            println!("  Current SHA: {}", short_sha(&record.sha));
        }
        match &result.status {
            SyncStatus::UpToDate => println!("  ✓ Already up to date"),
            SyncStatus::WouldUpdate { new_sha } => {
                println!("  [dry-run] Would update to {}", short_sha(new_sha));
            }
            SyncStatus::Updated { new_sha, refreshed } => {
                for path in refreshed {
                    println!("  Updated: {path}");
                }
                println!("  ✓ Updated to {}", short_sha(new_sha));
            }
            SyncStatus::Failed { error } => println!("  ✗ {error}"),
        }
        println!();
    }

    let summary = report.summary();
    println!("Summary: {summary}");
    if summary.updated > 0 {
        if report.dry_run {
            println!("Run without --dry-run to apply updates.");
        } else {
            println!("Run generate-lock to update the lockfile.");
        }
    }
}
