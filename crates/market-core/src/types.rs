//! Shared data model for the marketplace tooling.
//!
//! Covers the on-disk JSON documents: the plugin manifest
//! (`.claude-plugin/plugin.json`), the provenance record (`.source.json`) and
//! the marketplace index entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Location of the manifest relative to a plugin directory.
pub const MANIFEST_PATH: &str = ".claude-plugin/plugin.json";
/// Descriptor file marking a skill directory.
pub const SKILL_FILE: &str = "SKILL.md";
/// Provenance record marking a vendored source.
pub const PROVENANCE_FILE: &str = ".source.json";
/// Hooks file checked at the plugin root.
pub const ROOT_HOOKS_FILE: &str = "hooks.json";
/// Conventional hooks location inside a plugin.
pub const DEFAULT_HOOKS_FILE: &str = "hooks/hooks.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("{0}")]
    Read(#[from] io::Error),
    #[error("{0}")]
    Parse(#[from] serde_json::Error),
}

/// Author block of a plugin manifest.
///
/// Every field is optional at parse time so the validator can report what is
/// missing instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestAuthor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Parsed plugin manifest.
///
/// One schema for every marketplace variant: `category` and `hooks` are both
/// optional here and the active `ValidationProfile` decides which are allowed
/// or required.
///
/// Fields are read one by one from the JSON document. A field with the wrong
/// shape reads as absent, so only unparseable JSON fails the whole manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginManifest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `Some` whenever the document has a non-null `author`, even one that is
    /// not an object; its `name` is then absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<ManifestAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Explicit pointer to a hooks file, relative to the plugin root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hooks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Repository URL; npm-style `{"type": ..., "url": ...}` objects give their `url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

impl PluginManifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse manifest JSON. Fails only when the content is not JSON.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(content)?;
        Ok(Self::from_value(&value))
    }

    /// Pull manifest fields out of a JSON document.
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(doc) = value else {
            return Self::default();
        };

        let author = match doc.get("author") {
            None | Some(Value::Null) => None,
            Some(Value::Object(author)) => Some(ManifestAuthor {
                name: string_field(author, "name"),
                email: string_field(author, "email"),
                url: string_field(author, "url"),
            }),
            Some(_) => Some(ManifestAuthor::default()),
        };

        let repository = match doc.get("repository") {
            Some(Value::Object(repo)) => string_field(repo, "url"),
            _ => string_field(doc, "repository"),
        };

        let keywords = match doc.get("keywords") {
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect(),
            ),
            _ => None,
        };

        Self {
            name: string_field(doc, "name"),
            version: string_field(doc, "version"),
            description: string_field(doc, "description"),
            author,
            category: string_field(doc, "category"),
            hooks: string_field(doc, "hooks"),
            license: string_field(doc, "license"),
            keywords,
            homepage: string_field(doc, "homepage"),
            repository,
        }
    }

    pub fn name(&self) -> Option<&str> {
        non_empty(self.name.as_deref())
    }

    pub fn version(&self) -> Option<&str> {
        non_empty(self.version.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        non_empty(self.description.as_deref())
    }

    pub fn author_name(&self) -> Option<&str> {
        self.author
            .as_ref()
            .and_then(|a| non_empty(a.name.as_deref()))
    }

    pub fn category(&self) -> Option<&str> {
        non_empty(self.category.as_deref())
    }

    pub fn hooks(&self) -> Option<&str> {
        non_empty(self.hooks.as_deref())
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(String::from)
}

/// Treat empty strings the same as absent values.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Provenance of a vendored plugin, stored as `.source.json`.
///
/// Written only by the vendoring commands; validation and lock reconciliation
/// read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceRecord {
    /// Upstream repository URL.
    pub url: String,
    /// Upstream commit the vendored content was copied from.
    pub sha: String,
    /// When the vendored content was last refreshed. Reads as `None` when
    /// absent or not an RFC 3339 timestamp.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub synced_at: Option<DateTime<Utc>>,
    /// Paths inside the upstream repository that are vendored here.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Local skill directory for paths vendored under a custom name, keyed by
    /// upstream path. Other paths use their basename.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub names: BTreeMap<String, String>,
}

impl ProvenanceRecord {
    pub fn new(url: impl Into<String>, sha: impl Into<String>, synced_at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            sha: sha.into(),
            synced_at: Some(synced_at),
            paths: Vec::new(),
            names: BTreeMap::new(),
        }
    }

    /// Track an upstream path, keeping insertion order and skipping duplicates.
    ///
    /// Returns `true` when the path was newly added.
    pub fn track_path(&mut self, path: &str) -> bool {
        if self.paths.iter().any(|p| p == path) {
            return false;
        }
        self.paths.push(path.to_string());
        true
    }

    /// Serialize as pretty JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

/// One plugin entry in the marketplace index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplacePlugin {
    pub name: String,
    /// Plugin location relative to the repository root (`./plugins/...`).
    pub source: String,
    pub description: String,
    pub version: String,
    pub author: ManifestAuthor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl MarketplacePlugin {
    /// Build an index entry from a manifest, or `None` when the manifest lacks
    /// a name.
    pub fn from_manifest(manifest: &PluginManifest, source: String) -> Option<Self> {
        let name = manifest.name()?.to_string();
        Some(Self {
            name,
            source,
            description: manifest.description.clone().unwrap_or_default(),
            version: manifest.version.clone().unwrap_or_default(),
            author: manifest.author.clone().unwrap_or_default(),
            category: manifest.category().map(String::from),
            homepage: non_empty(manifest.homepage.as_deref()).map(String::from),
            repository: non_empty(manifest.repository.as_deref()).map(String::from),
            license: non_empty(manifest.license.as_deref()).map(String::from),
            keywords: manifest.keywords.clone().filter(|k| !k.is_empty()),
        })
    }
}
