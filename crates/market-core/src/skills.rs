//! SKILL.md frontmatter extraction.
//!
//! A skill is described by a markdown file whose first block, delimited by
//! `---` lines, holds YAML metadata. Parsing here is deliberately lenient:
//! every field is optional so the validator can report each missing or
//! malformed field on its own instead of stopping at the first one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error type for frontmatter extraction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkillError {
    #[error("missing YAML frontmatter")]
    MissingFrontmatter,
    #[error("invalid YAML frontmatter: {0}")]
    InvalidYaml(String),
}

/// Metadata block of a SKILL.md file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillFrontmatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Arbitrary key-value metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_yaml::Value>,
}

impl SkillFrontmatter {
    pub fn name(&self) -> Option<&str> {
        crate::types::non_empty(self.name.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        crate::types::non_empty(self.description.as_deref())
    }

    pub fn version(&self) -> Option<&str> {
        crate::types::non_empty(self.version.as_deref())
    }
}

/// Extracts YAML frontmatter from SKILL.md content.
///
/// Frontmatter must be delimited by `---` lines at the start of the file.
pub fn extract_frontmatter(content: &str) -> Result<&str, SkillError> {
    let trimmed = content.trim_start();
    let Some(after_open) = trimmed.strip_prefix("---") else {
        return Err(SkillError::MissingFrontmatter);
    };

    let after_newline = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .ok_or(SkillError::MissingFrontmatter)?;

    // Closing delimiter; an empty block closes immediately.
    if after_newline.starts_with("---") {
        return Ok("");
    }
    let close_pos = after_newline
        .find("\n---")
        .ok_or(SkillError::MissingFrontmatter)?;

    Ok(after_newline[..close_pos].trim_end_matches('\r'))
}

/// Parses the frontmatter of SKILL.md content.
///
/// Returns an error only when the block is absent or is not a YAML mapping;
/// missing fields are left as `None` for the caller to report.
pub fn parse_frontmatter(content: &str) -> Result<SkillFrontmatter, SkillError> {
    let block = extract_frontmatter(content)?;
    if block.trim().is_empty() {
        return Err(SkillError::MissingFrontmatter);
    }

    let value: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|e| SkillError::InvalidYaml(e.to_string()))?;
    let serde_yaml::Value::Mapping(map) = value else {
        return Err(SkillError::InvalidYaml(
            "frontmatter is not a mapping".to_string(),
        ));
    };

    let metadata = match map.get("metadata") {
        Some(serde_yaml::Value::Mapping(meta)) => meta
            .iter()
            .filter_map(|(k, v)| scalar_to_string(k).map(|k| (k, v.clone())))
            .collect(),
        _ => BTreeMap::new(),
    };

    Ok(SkillFrontmatter {
        name: map.get("name").and_then(scalar_to_string),
        description: map.get("description").and_then(scalar_to_string),
        version: map.get("version").and_then(scalar_to_string),
        license: map.get("license").and_then(scalar_to_string),
        metadata,
    })
}

/// Render a YAML scalar as a string (`version: 1.0` parses as a float).
fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_frontmatter_basic() {
        let content = r#"---
name: pdf-processing
description: Extract text and tables from PDF files.
version: 1.0.0
---

# PDF Processing

Instructions here.
"#;
        let fm = parse_frontmatter(content).expect("should parse");
        assert_eq!(fm.name(), Some("pdf-processing"));
        assert_eq!(fm.description(), Some("Extract text and tables from PDF files."));
        assert_eq!(fm.version(), Some("1.0.0"));
        assert!(fm.license.is_none());
        assert!(fm.metadata.is_empty());
    }

    #[test]
    fn parse_frontmatter_with_optional_fields() {
        let content = r#"---
name: code-review
description: Review code for best practices.
version: 2.1.0
license: Apache-2.0
metadata:
  author: example-org
  tags: [review, quality]
---

Body content.
"#;
        let fm = parse_frontmatter(content).expect("should parse");
        assert_eq!(fm.license.as_deref(), Some("Apache-2.0"));
        assert_eq!(
            fm.metadata.get("author"),
            Some(&serde_yaml::Value::String("example-org".to_string()))
        );
        assert!(fm.metadata.contains_key("tags"));
    }

    #[test]
    fn parse_frontmatter_keeps_missing_fields_empty() {
        let content = "---\ndescription: Has description but no name.\n---\n";
        let fm = parse_frontmatter(content).expect("should parse");
        assert!(fm.name().is_none());
        assert!(fm.version().is_none());
        assert!(fm.description().is_some());
    }

    #[test]
    fn parse_frontmatter_stringifies_numeric_version() {
        let content = "---\nname: numeric\ndescription: d\nversion: 1.0\n---\n";
        let fm = parse_frontmatter(content).expect("should parse");
        assert_eq!(fm.version(), Some("1.0"));
    }

    #[test]
    fn parse_frontmatter_treats_empty_strings_as_missing() {
        let content = "---\nname: \"\"\ndescription: \"\"\nversion: 1.0.0\n---\n";
        let fm = parse_frontmatter(content).expect("should parse");
        assert!(fm.name().is_none());
        assert!(fm.description().is_none());
    }

    #[test]
    fn missing_frontmatter_is_an_error() {
        let err = parse_frontmatter("# No frontmatter\n\nJust markdown.").unwrap_err();
        assert_eq!(err, SkillError::MissingFrontmatter);
    }

    #[test]
    fn missing_closing_delimiter_is_an_error() {
        let err = parse_frontmatter("---\nname: bad\ndescription: No closing\n").unwrap_err();
        assert_eq!(err, SkillError::MissingFrontmatter);
    }

    #[test]
    fn empty_block_is_an_error() {
        let err = parse_frontmatter("---\n---\nbody").unwrap_err();
        assert_eq!(err, SkillError::MissingFrontmatter);
    }

    #[test]
    fn non_mapping_block_is_invalid_yaml() {
        let err = parse_frontmatter("---\n- a\n- b\n---\n").unwrap_err();
        assert!(matches!(err, SkillError::InvalidYaml(_)));
    }

    #[test]
    fn broken_yaml_is_invalid_yaml() {
        let err = parse_frontmatter("---\nname: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, SkillError::InvalidYaml(_)));
    }

    #[test]
    fn crlf_frontmatter_is_accepted() {
        let content = "---\r\nname: windows\r\ndescription: d\r\nversion: 1.0.0\r\n---\r\nbody";
        let fm = parse_frontmatter(content).expect("should parse");
        assert_eq!(fm.name(), Some("windows"));
    }
}
