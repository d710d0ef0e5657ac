//! Naming rules and the injectable validation profile.

use regex::Regex;
use std::sync::LazyLock;

static KEBAB_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").expect("kebab-case pattern compiles")
});

static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+$").expect("semver pattern compiles")
});

/// Number of sha characters shown in reports.
pub const SHORT_SHA_LEN: usize = 7;

/// Lowercase words joined by single hyphens, starting with a letter.
pub fn is_kebab_case(name: &str) -> bool {
    KEBAB_CASE.is_match(name)
}

/// Plain `x.y.z` version (no pre-release or build suffix).
pub fn is_semver(version: &str) -> bool {
    SEMVER.is_match(version)
}

/// Shorten a commit sha for display.
pub fn short_sha(sha: &str) -> &str {
    match sha.char_indices().nth(SHORT_SHA_LEN) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}

/// Marketplace-specific manifest rules.
///
/// Different marketplaces accept different manifest shapes (with or without a
/// category enum, with or without a `hooks` pointer). The validator is the same
/// for all of them; only this profile changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationProfile {
    /// When set, every manifest must declare a category from this list.
    pub allowed_categories: Option<Vec<String>>,
    /// Whether manifests may declare an explicit `hooks` pointer.
    pub allow_hooks_field: bool,
    /// File extensions (without the dot) that must be executable.
    pub script_extensions: Vec<String>,
}

impl Default for ValidationProfile {
    fn default() -> Self {
        Self {
            allowed_categories: None,
            allow_hooks_field: true,
            script_extensions: vec!["sh".to_string()],
        }
    }
}

impl ValidationProfile {
    /// Restrict categories to the given list.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn category_allowed(&self, category: &str) -> bool {
        self.allowed_categories
            .as_ref()
            .is_none_or(|allowed| allowed.iter().any(|c| c == category))
    }

    pub fn is_script(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && self.script_extensions.iter().any(|e| e == ext))
    }
}
