//! Plugin validation.
//!
//! Every check appends to one `IssueCollector` owned by the run. Checks never
//! short-circuit each other, so a single pass reports everything wrong with a
//! plugin. The one exception: a plugin without any content skips skills-area
//! validation.

mod checks;
mod manifest;

pub use checks::{check_contents, check_hooks, check_scripts, check_skills_dir};
pub use manifest::{validate_manifest, validate_skill_md};

use crate::discovery::PluginContents;
use market_core::{IssueCollector, ValidationIssue, ValidationProfile};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Mutable state for one validation run.
///
/// Created at run start and passed by `&mut` into every check; nothing
/// outlives the run.
#[derive(Debug)]
pub struct ValidationContext<'a> {
    pub profile: &'a ValidationProfile,
    pub issues: IssueCollector,
    /// Skill names seen so far; the first occurrence of a name registers it.
    pub skill_names: HashSet<String>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(profile: &'a ValidationProfile) -> Self {
        Self {
            profile,
            issues: IssueCollector::new(),
            skill_names: HashSet::new(),
        }
    }
}

/// Per-plugin verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOutcome {
    pub path: PathBuf,
    pub valid: bool,
}

/// Result of validating a set of plugins.
#[derive(Debug)]
pub struct ValidationReport {
    pub plugins: Vec<PluginOutcome>,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn valid_count(&self) -> usize {
        self.plugins.iter().filter(|p| p.valid).count()
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate every plugin in order, sharing one issue list and one skill-name
/// set across all of them.
pub fn validate_plugins(plugin_dirs: &[PathBuf], profile: &ValidationProfile) -> ValidationReport {
    let mut ctx = ValidationContext::new(profile);
    let plugins = plugin_dirs
        .iter()
        .map(|dir| PluginOutcome {
            path: dir.clone(),
            valid: validate_plugin(dir, &mut ctx),
        })
        .collect();

    ValidationReport {
        plugins,
        issues: ctx.issues.into_vec(),
    }
}

/// Run every check against one plugin directory.
///
/// Returns `true` when no check added an issue.
pub fn validate_plugin(plugin_dir: &Path, ctx: &mut ValidationContext<'_>) -> bool {
    let checkpoint = ctx.issues.checkpoint();

    let manifest = validate_manifest(plugin_dir, ctx);
    let contents = PluginContents::inspect(plugin_dir, manifest.as_ref());

    if check_contents(plugin_dir, &contents, ctx) && contents.skills {
        check_skills_dir(plugin_dir, ctx);
    }
    check_scripts(plugin_dir, ctx);
    check_hooks(plugin_dir, manifest.as_ref(), ctx);

    let added = ctx.issues.since(checkpoint).len();
    debug!(path = %plugin_dir.display(), issues = added, "validated plugin");
    added == 0
}
