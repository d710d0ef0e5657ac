//! marketctl - maintenance tooling for a plugin marketplace repository.
//!
//! Validates plugins and skills, keeps `marketplace.lock` and the marketplace
//! index in step with the tree, and vendors skills from upstream repositories.

pub mod discovery;
pub mod git;
pub mod index;
pub mod lockfile;
pub mod provenance;
pub mod render;
pub mod validate;
pub mod vendor;
pub mod walker;

use market_core::config::ConfigError;
use market_core::Config;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A marketplace repository: its root and the resolved configuration.
///
/// Every configured path is absolute once the workspace is open.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
}

impl Workspace {
    /// Open the repository at `root`.
    ///
    /// Loads `.market/config` when present, then `config_file` on top of it.
    pub fn open(root: PathBuf, config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::for_root(&root)?;
        if let Some(path) = config_file {
            config.load_file(path)?;
        }
        config.resolve_paths(&root);
        for key in &config.unknown_keys {
            warn!(key = %key, "unknown config key");
        }
        debug!(root = %root.display(), "opened workspace");
        Ok(Self { root, config })
    }

    /// Pick the repository root: the explicit one, else the enclosing git
    /// checkout, else the current directory.
    pub fn discover_root(explicit: Option<PathBuf>) -> io::Result<PathBuf> {
        if let Some(root) = explicit {
            return Ok(root);
        }
        match git::toplevel() {
            Some(root) => Ok(root),
            None => std::env::current_dir(),
        }
    }

    /// Plugin directories a `validate` run covers.
    ///
    /// With a target, only that directory (relative to the root). Otherwise
    /// every plugin under the plugins root and, when enabled, the templates
    /// root. An unreadable scan root is logged and contributes nothing.
    pub fn validation_targets(&self, target: Option<&Path>) -> Vec<PathBuf> {
        if let Some(target) = target {
            return vec![self.root.join(target)];
        }

        let mut roots = vec![&self.config.plugins_dir];
        if self.config.validate_templates {
            roots.push(&self.config.templates_dir);
        }

        let mut plugins = Vec::new();
        for root in roots {
            match discovery::find_plugins(root) {
                Ok(found) => plugins.extend(found),
                Err(e) => warn!(error = %e, "skipping unreadable plugin root"),
            }
        }
        plugins
    }

    /// Upstream sha of a vendored plugin, if it has a provenance record.
    pub fn external_sha(&self, plugin_dir: &Path) -> Option<String> {
        provenance::resolve(plugin_dir, &self.config.plugins_dir).map(|record| record.sha)
    }
}
