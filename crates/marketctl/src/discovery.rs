//! Plugin and skill discovery.
//!
//! Both are tree walks with a different marker: a plugin directory holds
//! `.claude-plugin/plugin.json`, a skill directory holds `SKILL.md`.

use crate::walker::{self, find_marked_dirs};
use market_core::types::{
    PluginManifest, DEFAULT_HOOKS_FILE, MANIFEST_PATH, ROOT_HOOKS_FILE, SKILL_FILE,
};
use std::path::{Path, PathBuf};

/// Find all plugin directories under `root`.
pub fn find_plugins(root: &Path) -> walker::Result<Vec<PathBuf>> {
    find_marked_dirs(root, |dir| dir.join(MANIFEST_PATH).is_file())
}

/// Find all skill directories under `root`.
pub fn find_skills(root: &Path) -> walker::Result<Vec<PathBuf>> {
    find_marked_dirs(root, |dir| dir.join(SKILL_FILE).is_file())
}

/// Which content kinds a plugin directory exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PluginContents {
    pub skills: bool,
    pub commands: bool,
    pub agents: bool,
    pub hooks: bool,
}

impl PluginContents {
    /// Inspect a plugin directory. A declared hooks pointer counts when the
    /// file it names exists.
    pub fn inspect(plugin_dir: &Path, manifest: Option<&PluginManifest>) -> Self {
        let declared_hooks = manifest
            .and_then(PluginManifest::hooks)
            .is_some_and(|hooks| plugin_dir.join(hooks).is_file());

        Self {
            skills: plugin_dir.join("skills").exists(),
            commands: plugin_dir.join("commands").exists(),
            agents: plugin_dir.join("agents").exists(),
            hooks: declared_hooks
                || plugin_dir.join(ROOT_HOOKS_FILE).exists()
                || plugin_dir.join(DEFAULT_HOOKS_FILE).exists(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.skills || self.commands || self.agents || self.hooks)
    }
}

/// Render `path` relative to `root` with forward slashes.
///
/// Paths outside `root` are returned unchanged.
pub fn relative_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_plugin(dir: &Path) {
        fs::create_dir_all(dir.join(".claude-plugin")).unwrap();
        fs::write(dir.join(MANIFEST_PATH), "{}").unwrap();
    }

    fn make_skill(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(SKILL_FILE), "---\nname: x\n---\n").unwrap();
    }

    #[test]
    fn finds_plugins_by_manifest() {
        let tmp = TempDir::new().unwrap();
        make_plugin(&tmp.path().join("core"));
        make_plugin(&tmp.path().join("external/acme/tools"));
        fs::create_dir_all(tmp.path().join("not-a-plugin/.claude-plugin")).unwrap();

        let plugins = find_plugins(tmp.path()).unwrap();
        assert_eq!(
            plugins,
            vec![tmp.path().join("core"), tmp.path().join("external/acme/tools")]
        );
    }

    #[test]
    fn finds_skills_inside_plugins() {
        let tmp = TempDir::new().unwrap();
        make_plugin(&tmp.path().join("core"));
        make_skill(&tmp.path().join("core/skills/review"));
        make_skill(&tmp.path().join("core/skills/lint"));
        fs::create_dir_all(tmp.path().join("core/skills/draft")).unwrap();

        let skills = find_skills(tmp.path()).unwrap();
        assert_eq!(
            skills,
            vec![
                tmp.path().join("core/skills/lint"),
                tmp.path().join("core/skills/review"),
            ]
        );
    }

    #[test]
    fn contents_detects_each_kind() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        assert!(PluginContents::inspect(dir, None).is_empty());

        fs::create_dir_all(dir.join("commands")).unwrap();
        let contents = PluginContents::inspect(dir, None);
        assert!(contents.commands);
        assert!(!contents.is_empty());
    }

    #[test]
    fn contents_counts_declared_hooks() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        fs::create_dir_all(dir.join("config")).unwrap();
        fs::write(dir.join("config/hooks.json"), "{}").unwrap();
        let manifest = PluginManifest {
            hooks: Some("./config/hooks.json".to_string()),
            ..Default::default()
        };

        assert!(PluginContents::inspect(dir, Some(&manifest)).hooks);
        assert!(!PluginContents::inspect(dir, None).hooks);
    }

    #[test]
    fn relative_path_uses_forward_slashes() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_path(root, Path::new("/repo/plugins/core/skills/a")),
            "plugins/core/skills/a"
        );
        assert_eq!(relative_path(root, Path::new("/elsewhere/x")), "/elsewhere/x");
    }
}
