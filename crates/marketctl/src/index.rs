//! Marketplace index (`.claude-plugin/marketplace.json`) generation.
//!
//! Only the `plugins` array is regenerated. Every other key of the document is
//! read, kept in place and written back.

use crate::discovery::{find_plugins, relative_path};
use market_core::types::{MarketplacePlugin, PluginManifest, MANIFEST_PATH};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid marketplace JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} must contain a JSON object", path.display())]
    NotAnObject { path: PathBuf },
    #[error(
        "safety check failed: no plugins found under {}; refusing to overwrite the marketplace index",
        path.display()
    )]
    NoPlugins { path: PathBuf },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize marketplace index: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// A plugin left out of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPlugin {
    pub path: PathBuf,
    pub reason: String,
}

/// Index entries built from the plugin tree.
#[derive(Debug, Clone, Default)]
pub struct IndexBuild {
    /// Sorted by name.
    pub plugins: Vec<MarketplacePlugin>,
    pub skipped: Vec<SkippedPlugin>,
    /// Number of plugin directories discovered.
    pub discovered: usize,
}

/// Read the existing index document.
pub fn load_document(path: &Path) -> Result<Map<String, Value>> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            IndexError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            IndexError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let value: Value = serde_json::from_str(&content).map_err(|source| IndexError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(IndexError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Build index entries for every plugin under `plugins_root`.
///
/// An unreadable plugins root yields no entries. Plugins whose manifest cannot
/// be loaded, or that have no name, are skipped.
pub fn collect_plugins(root: &Path, plugins_root: &Path) -> IndexBuild {
    let dirs = match find_plugins(plugins_root) {
        Ok(dirs) => dirs,
        Err(e) => {
            warn!(error = %e, "cannot read plugins directory");
            Vec::new()
        }
    };

    let mut build = IndexBuild {
        discovered: dirs.len(),
        ..IndexBuild::default()
    };

    for dir in dirs {
        let rel = relative_path(root, &dir);
        let manifest = match PluginManifest::load(&dir.join(MANIFEST_PATH)) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "skipping plugin with unloadable manifest");
                build.skipped.push(SkippedPlugin {
                    path: dir,
                    reason: format!("invalid plugin.json: {e}"),
                });
                continue;
            }
        };

        match MarketplacePlugin::from_manifest(&manifest, format!("./{rel}")) {
            Some(entry) => build.plugins.push(entry),
            None => build.skipped.push(SkippedPlugin {
                path: dir,
                reason: "plugin.json has no name".to_string(),
            }),
        }
    }

    build.plugins.sort_by(|a, b| a.name.cmp(&b.name));
    build
}

/// Regenerate the `plugins` array of the index at `index_path`.
///
/// Refuses to write when no plugin directory is found.
pub fn generate_index(root: &Path, plugins_root: &Path, index_path: &Path) -> Result<IndexBuild> {
    let mut document = load_document(index_path)?;

    let build = collect_plugins(root, plugins_root);
    if build.discovered == 0 {
        return Err(IndexError::NoPlugins {
            path: plugins_root.to_path_buf(),
        });
    }

    document.insert(
        "plugins".to_string(),
        serde_json::to_value(&build.plugins)?,
    );

    let mut content = serde_json::to_string_pretty(&Value::Object(document))?;
    content.push('\n');
    fs::write(index_path, content).map_err(|source| IndexError::Write {
        path: index_path.to_path_buf(),
        source,
    })?;
    info!(path = %index_path.display(), plugins = build.plugins.len(), "wrote marketplace index");

    Ok(build)
}
