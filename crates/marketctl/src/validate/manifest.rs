use super::ValidationContext;
use market_core::rules::{is_kebab_case, is_semver};
use market_core::skills::parse_frontmatter;
use market_core::types::{ManifestError, PluginManifest, MANIFEST_PATH};
use std::fs;
use std::path::Path;

/// Check `.claude-plugin/plugin.json` of a plugin.
///
/// Returns the parsed manifest when it could be loaded, whether or not its
/// fields pass, so later checks can look at `hooks`.
pub fn validate_manifest(
    plugin_dir: &Path,
    ctx: &mut ValidationContext<'_>,
) -> Option<PluginManifest> {
    let path = plugin_dir.join(MANIFEST_PATH);
    if !path.exists() {
        ctx.issues.push(&path, "Missing .claude-plugin/plugin.json");
        return None;
    }

    let manifest = match PluginManifest::load(&path) {
        Ok(manifest) => manifest,
        Err(ManifestError::Read(e)) => {
            ctx.issues.push(&path, format!("Cannot read file: {e}"));
            return None;
        }
        Err(ManifestError::Parse(e)) => {
            ctx.issues.push(&path, format!("Invalid JSON: {e}"));
            return None;
        }
    };

    match manifest.name() {
        None => ctx.issues.push(&path, "Missing required field: name"),
        Some(name) if !is_kebab_case(name) => ctx.issues.push(
            &path,
            format!("Invalid name format: \"{name}\" (must be kebab-case)"),
        ),
        Some(_) => {}
    }

    match manifest.version() {
        None => ctx.issues.push(&path, "Missing required field: version"),
        Some(version) if !is_semver(version) => ctx.issues.push(
            &path,
            format!("Invalid version format: \"{version}\" (must be x.y.z)"),
        ),
        Some(_) => {}
    }

    if manifest.description().is_none() {
        ctx.issues.push(&path, "Missing required field: description");
    }

    if manifest.author.is_none() {
        ctx.issues.push(&path, "Missing required field: author");
    } else if manifest.author_name().is_none() {
        ctx.issues.push(&path, "Missing required field: author.name");
    }

    if let Some(allowed) = &ctx.profile.allowed_categories {
        match manifest.category() {
            None => ctx.issues.push(&path, "Missing required field: category"),
            Some(category) if !ctx.profile.category_allowed(category) => ctx.issues.push(
                &path,
                format!(
                    "Invalid category: \"{category}\" (must be one of: {})",
                    allowed.join(", ")
                ),
            ),
            Some(_) => {}
        }
    }

    if !ctx.profile.allow_hooks_field && manifest.hooks().is_some() {
        ctx.issues
            .push(&path, "hooks field is not supported by this marketplace");
    }

    Some(manifest)
}

/// Check one `SKILL.md` file and register its name in the run.
pub fn validate_skill_md(skill_md: &Path, ctx: &mut ValidationContext<'_>) {
    if !skill_md.exists() {
        ctx.issues.push(skill_md, "Missing SKILL.md");
        return;
    }

    let content = match fs::read_to_string(skill_md) {
        Ok(content) => content,
        Err(e) => {
            ctx.issues.push(skill_md, format!("Cannot read file: {e}"));
            return;
        }
    };

    let Ok(frontmatter) = parse_frontmatter(&content) else {
        ctx.issues
            .push(skill_md, "Missing or invalid YAML frontmatter");
        return;
    };

    match frontmatter.name() {
        None => ctx
            .issues
            .push(skill_md, "Missing required frontmatter field: name"),
        Some(name) => {
            if !is_kebab_case(name) {
                ctx.issues.push(
                    skill_md,
                    format!("Invalid name format: \"{name}\" (must be kebab-case)"),
                );
            }
            if !ctx.skill_names.insert(name.to_string()) {
                ctx.issues
                    .push(skill_md, format!("Duplicate skill name: \"{name}\""));
            }
        }
    }

    if frontmatter.description().is_none() {
        ctx.issues
            .push(skill_md, "Missing required frontmatter field: description");
    }

    match frontmatter.version() {
        None => ctx
            .issues
            .push(skill_md, "Missing required frontmatter field: version"),
        Some(version) if !is_semver(version) => ctx.issues.push(
            skill_md,
            format!("Invalid version format: \"{version}\" (must be x.y.z)"),
        ),
        Some(_) => {}
    }
}
