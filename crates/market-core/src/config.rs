//! Configuration parsing for the marketplace tooling.
//!
//! Reads the key=value format from `.market/config` at the repository root.
//! Precedence: `--config` file > `.market/config` > defaults.

use crate::rules::ValidationProfile;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Location of the config file relative to the repository root.
pub const CONFIG_PATH: &str = ".market/config";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid config line: {0}")]
    InvalidLine(String),
    #[error("invalid boolean value for {key}: {value}")]
    InvalidBool { key: String, value: String },
}

/// Repository layout and validation settings.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    // Directories
    pub plugins_dir: PathBuf,
    pub templates_dir: PathBuf,
    /// Where `add-external` vendors sources and `sync-external` looks for them.
    pub external_dir: PathBuf,

    // Generated files
    pub lock_file: PathBuf,
    pub marketplace_file: PathBuf,

    // Validation
    /// Also validate plugins under `templates_dir` (default: true).
    pub validate_templates: bool,
    /// Extensions that must carry an execute bit (default: sh).
    pub script_extensions: Vec<String>,
    /// Allowed manifest categories; empty means unrestricted.
    pub categories: Vec<String>,
    /// Whether manifests may declare a `hooks` pointer (default: true).
    pub allow_hooks_field: bool,

    /// Keys read from config files that were not recognized.
    #[serde(skip)]
    pub unknown_keys: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plugins_dir: PathBuf::from("plugins"),
            templates_dir: PathBuf::from("templates"),
            external_dir: PathBuf::from("plugins/external"),
            lock_file: PathBuf::from("marketplace.lock"),
            marketplace_file: PathBuf::from(".claude-plugin/marketplace.json"),
            validate_templates: true,
            script_extensions: vec!["sh".to_string()],
            categories: Vec::new(),
            allow_hooks_field: true,
            unknown_keys: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from a file, merging with defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.load_file(path)?;
        Ok(config)
    }

    /// Load `.market/config` under the root if present, else defaults.
    pub fn for_root(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_PATH);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and merge values from a config file.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        self.parse_content(&content)
    }

    /// Parse config content (key=value format).
    fn parse_content(&mut self, content: &str) -> Result<(), ConfigError> {
        for line in content.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::InvalidLine(line.to_string()));
            };

            let key = key.trim();
            let value = Self::unquote(value.trim());

            self.apply_value(key, &value)?;
        }
        Ok(())
    }

    /// Remove surrounding quotes from a value.
    fn unquote(value: &str) -> String {
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            return value[1..value.len() - 1].to_string();
        }
        value.to_string()
    }

    /// Apply a single config value.
    fn apply_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "plugins_dir" => self.plugins_dir = PathBuf::from(value),
            "templates_dir" => self.templates_dir = PathBuf::from(value),
            "external_dir" => self.external_dir = PathBuf::from(value),
            "lock_file" => self.lock_file = PathBuf::from(value),
            "marketplace_file" => self.marketplace_file = PathBuf::from(value),
            "validate_templates" => self.validate_templates = Self::parse_bool(key, value)?,
            "script_extensions" => {
                self.script_extensions = value
                    .split_whitespace()
                    .map(|ext| ext.trim_start_matches('.').to_string())
                    .collect();
            }
            "categories" => {
                self.categories = value.split_whitespace().map(String::from).collect();
            }
            "allow_hooks_field" => self.allow_hooks_field = Self::parse_bool(key, value)?,
            // Kept for the caller to report; not fatal.
            _ => self.unknown_keys.push(key.to_string()),
        }
        Ok(())
    }

    /// Parse a boolean value.
    fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "on" => Ok(true),
            "false" | "0" | "no" | "n" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Resolve relative paths against the repository root.
    pub fn resolve_paths(&mut self, root: &Path) {
        for path in [
            &mut self.plugins_dir,
            &mut self.templates_dir,
            &mut self.external_dir,
            &mut self.lock_file,
            &mut self.marketplace_file,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
    }

    /// Build the manifest rule set for this marketplace.
    pub fn validation_profile(&self) -> ValidationProfile {
        ValidationProfile {
            allowed_categories: (!self.categories.is_empty()).then(|| self.categories.clone()),
            allow_hooks_field: self.allow_hooks_field,
            script_extensions: self.script_extensions.clone(),
        }
    }
}
