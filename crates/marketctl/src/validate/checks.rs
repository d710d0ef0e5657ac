//! Plugin-level checks that look at the directory rather than the manifest.

use super::manifest::validate_skill_md;
use super::ValidationContext;
use crate::discovery::PluginContents;
use crate::walker::is_hidden;
use market_core::types::{
    PluginManifest, DEFAULT_HOOKS_FILE, MANIFEST_PATH, ROOT_HOOKS_FILE, SKILL_FILE,
};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A plugin must expose at least one kind of content.
///
/// Returns `false` (after recording the issue) when it exposes none.
pub fn check_contents(
    plugin_dir: &Path,
    contents: &PluginContents,
    ctx: &mut ValidationContext<'_>,
) -> bool {
    if contents.is_empty() {
        ctx.issues.push(
            plugin_dir,
            "Plugin must have at least one of: skills/, commands/, agents/, or hooks.json",
        );
        return false;
    }
    true
}

/// Check the shape of `skills/` and validate every skill in it.
pub fn check_skills_dir(plugin_dir: &Path, ctx: &mut ValidationContext<'_>) {
    let skills_dir = plugin_dir.join("skills");
    if !skills_dir.is_dir() {
        ctx.issues.push(plugin_dir, "skills is not a directory");
        return;
    }

    let mut children: Vec<PathBuf> = match fs::read_dir(&skills_dir) {
        Ok(entries) => entries.filter_map(Result::ok).map(|e| e.path()).collect(),
        Err(e) => {
            debug!(path = %skills_dir.display(), error = %e, "cannot list skills directory");
            Vec::new()
        }
    };
    children.sort();

    let mut has_skills = false;
    for child in children.iter().filter(|p| p.is_dir()) {
        let skill_md = child.join(SKILL_FILE);
        if !skill_md.exists() {
            ctx.issues.push(child, "Missing SKILL.md");
            continue;
        }
        has_skills = true;
        validate_skill_md(&skill_md, ctx);
    }

    if !has_skills {
        ctx.issues
            .push(&skills_dir, "skills/ directory exists but contains no skills");
    }
}

/// Every script anywhere under the plugin must be executable.
pub fn check_scripts(plugin_dir: &Path, ctx: &mut ValidationContext<'_>) {
    let mut scripts = Vec::new();
    let mut visited = HashSet::new();
    collect_scripts(plugin_dir, ctx, &mut visited, &mut scripts);

    for script in scripts {
        if !is_executable(&script) {
            ctx.issues.push(
                &script,
                "Shell script is not executable (missing +x permission)",
            );
        }
    }
}

fn collect_scripts(
    dir: &Path,
    ctx: &ValidationContext<'_>,
    visited: &mut HashSet<PathBuf>,
    scripts: &mut Vec<PathBuf>,
) {
    if let Ok(canonical) = dir.canonicalize() {
        if !visited.insert(canonical) {
            return;
        }
    }

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(Result::ok).map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if is_hidden(&path) {
            continue;
        }
        let Ok(meta) = fs::metadata(&path) else {
            continue;
        };
        if meta.is_dir() {
            collect_scripts(&path, ctx, visited, scripts);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| ctx.profile.is_script(n))
        {
            scripts.push(path);
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path).map_or(true, |m| m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

/// Hooks must be reachable: either at the default location or declared.
pub fn check_hooks(
    plugin_dir: &Path,
    manifest: Option<&PluginManifest>,
    ctx: &mut ValidationContext<'_>,
) {
    // Unloadable manifests are already reported.
    let Some(manifest) = manifest else {
        return;
    };

    let root_hooks = plugin_dir.join(ROOT_HOOKS_FILE);
    let declared = manifest.hooks();

    if root_hooks.exists() && !plugin_dir.join(DEFAULT_HOOKS_FILE).exists() && declared.is_none()
    {
        ctx.issues.push(
            &root_hooks,
            "hooks.json exists at plugin root but is not declared in plugin.json. \
             Add \"hooks\": \"./hooks.json\" to make it discoverable.",
        );
    }

    if let Some(hooks) = declared {
        if !plugin_dir.join(hooks).exists() {
            ctx.issues.push(
                plugin_dir.join(MANIFEST_PATH),
                format!("hooks field references \"{hooks}\" but file does not exist"),
            );
        }
    }
}
