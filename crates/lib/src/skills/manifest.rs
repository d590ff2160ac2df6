//! Skill metadata as declared on disk: `manifest.json`, or YAML frontmatter in `SKILL.md`.

use serde::Deserialize;

/// Metadata file read first when present.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Skill documentation; its frontmatter is the metadata when there is no manifest.json.
pub const SKILL_DOC_FILE: &str = "SKILL.md";

/// Declared skill metadata. Shared by manifest.json (camelCase) and SKILL.md frontmatter,
/// which may also use `name` and `triggers`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default, alias = "name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "triggers")]
    pub trigger_hints: Vec<String>,
    #[serde(default)]
    pub entry: Option<String>,
    /// Free-form settings handed to a builtin at bind time.
    #[serde(default)]
    pub options: serde_json::Value,
    #[serde(default)]
    pub metadata: Option<ManifestMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default)]
    pub requires: Option<Requires>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Requires {
    #[serde(default)]
    pub bins: Option<Vec<String>>,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    /// Parse the frontmatter block of a SKILL.md.
    pub fn from_skill_doc(content: &str) -> Result<Self, String> {
        let (yaml, _) = split_frontmatter(content)
            .ok_or_else(|| "SKILL.md has no `---` frontmatter block".to_string())?;
        if yaml.trim().is_empty() {
            return Err("SKILL.md frontmatter is empty".to_string());
        }
        serde_yaml::from_str(yaml).map_err(|e| e.to_string())
    }

    /// Binaries that must be on PATH for this skill to load.
    pub fn required_bins(&self) -> &[String] {
        self.metadata
            .as_ref()
            .and_then(|m| m.requires.as_ref())
            .and_then(|r| r.bins.as_deref())
            .unwrap_or(&[])
    }
}

/// Split `---\n<yaml>\n---\n<body>` into (yaml, body). None when the content has no frontmatter.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content.trim_start_matches('\u{feff}').strip_prefix("---")?;
    let (opening, rest) = rest.split_once('\n')?;
    if !opening.trim().is_empty() {
        return None;
    }
    let end = if rest.starts_with("---") {
        0
    } else {
        rest.find("\n---")? + 1
    };
    let yaml = &rest[..end];
    let after = &rest[end + 3..];
    let body = match after.split_once('\n') {
        Some((closing, body)) if closing.trim().is_empty() => body,
        None if after.trim().is_empty() => "",
        _ => return None,
    };
    Some((yaml, body))
}

/// Documentation body of a SKILL.md: everything after the frontmatter, or the whole file.
pub fn documentation_body(content: &str) -> &str {
    split_frontmatter(content)
        .map(|(_, body)| body)
        .unwrap_or(content)
        .trim()
}
