//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.disclose/config.json`) and environment.
//! A missing file means defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assistant::AssistantOptions;
use crate::skills::LoadOptions;

/// Env var overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "DISCLOSE_CONFIG_PATH";
/// Env var overriding the skills root.
pub const SKILLS_DIR_ENV: &str = "DISCLOSE_SKILLS_DIR";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Skill load paths and options.
    #[serde(default)]
    pub skills: SkillsConfig,

    /// Turn handling and presentation.
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// Skills load config (dirs, disabled list, script permission, invocation deadline).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsConfig {
    /// Override the default skill root. Relative paths are resolved against the config file's parent. Omit to use `skills` next to the config file.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Extra skill directories, searched after the root. On duplicate ids the earlier skill wins.
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,
    /// Skill ids to skip even when present on disk.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// When true, skills may use `entry: script:<name>` to run a file from their scripts/ directory via sh. Default: false.
    #[serde(default)]
    pub allow_scripts: bool,
    /// Deadline for one skill invocation, in seconds (default 30).
    #[serde(default = "default_invoke_timeout_secs")]
    pub invoke_timeout_secs: u64,
}

/// Assistant behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    /// Prefix skill replies with `[skill-id]` (default true).
    #[serde(default = "default_true")]
    pub show_attribution: bool,
    /// Prior turns handed to skills and the reasoner (default 20).
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_invoke_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_history_limit() -> usize {
    20
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            extra_dirs: Vec::new(),
            disabled: Vec::new(),
            allow_scripts: false,
            invoke_timeout_secs: default_invoke_timeout_secs(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            show_attribution: default_true(),
            history_limit: default_history_limit(),
        }
    }
}

impl Config {
    /// Loader options; relative extra dirs resolve against the config file's parent.
    pub fn load_options(&self, config_path: &Path) -> LoadOptions {
        let parent = config_parent(config_path);
        LoadOptions {
            extra_dirs: self
                .skills
                .extra_dirs
                .iter()
                .map(|d| if d.is_absolute() { d.clone() } else { parent.join(d) })
                .collect(),
            disabled: self.skills.disabled.clone(),
            allow_scripts: self.skills.allow_scripts,
        }
    }

    pub fn assistant_options(&self) -> AssistantOptions {
        AssistantOptions {
            invoke_timeout: Duration::from_secs(self.skills.invoke_timeout_secs.max(1)),
            history_limit: self.assistant.history_limit,
        }
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV).map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".disclose").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, or the default path (or DISCLOSE_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used (for resolving the config directory).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

fn config_parent(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Default skill root when no override is set: `skills` subdirectory of the config file's parent.
pub fn skills_dir(config_path: &Path) -> PathBuf {
    config_parent(config_path).join("skills")
}

/// Resolve the skill root: `config.skills.directory` if set (relative paths resolved against the config file's parent), otherwise the default `skills` subdirectory.
pub fn resolve_skills_dir(config: &Config, config_path: &Path) -> PathBuf {
    match &config.skills.directory {
        Some(d) if !d.as_os_str().is_empty() => {
            if d.is_absolute() {
                d.clone()
            } else {
                config_parent(config_path).join(d)
            }
        }
        _ => skills_dir(config_path),
    }
}

/// Skill root with overrides applied: explicit (CLI flag) > DISCLOSE_SKILLS_DIR > config.
pub fn resolve_skills_root(
    explicit: Option<PathBuf>,
    config: &Config,
    config_path: &Path,
) -> PathBuf {
    explicit
        .or_else(|| {
            std::env::var_os(SKILLS_DIR_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| resolve_skills_dir(config, config_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.assistant.show_attribution);
        assert_eq!(config.assistant.history_limit, 20);
        assert_eq!(config.skills.invoke_timeout_secs, 30);
        assert!(!config.skills.allow_scripts);
        assert_eq!(
            config.assistant_options().invoke_timeout,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn parses_camel_case() {
        let config: Config = serde_json::from_str(
            r#"{"skills":{"extraDirs":["more"],"disabled":["clock"],"allowScripts":true,"invokeTimeoutSecs":5},"assistant":{"showAttribution":false}}"#,
        )
        .unwrap();
        assert!(config.skills.allow_scripts);
        assert!(!config.assistant.show_attribution);
        let opts = config.load_options(Path::new("/home/user/.disclose/config.json"));
        assert_eq!(opts.extra_dirs, vec![PathBuf::from("/home/user/.disclose/more")]);
        assert_eq!(opts.disabled, vec!["clock".to_string()]);
        assert!(opts.allow_scripts);
        assert_eq!(
            config.assistant_options().invoke_timeout,
            Duration::from_secs(5)
        );
    }

    #[test]
    fn resolve_skills_dir_default() {
        let config = Config::default();
        let path = Path::new("/home/user/.disclose/config.json");
        assert_eq!(
            resolve_skills_dir(&config, path),
            PathBuf::from("/home/user/.disclose/skills")
        );
    }

    #[test]
    fn resolve_skills_dir_override_relative() {
        let mut config = Config::default();
        config.skills.directory = Some(PathBuf::from("custom/skills"));
        let path = Path::new("/home/user/.disclose/config.json");
        assert_eq!(
            resolve_skills_dir(&config, path),
            PathBuf::from("/home/user/.disclose/custom/skills")
        );
    }

    #[test]
    fn resolve_skills_dir_override_absolute() {
        let mut config = Config::default();
        config.skills.directory = Some(PathBuf::from("/repo/skills"));
        let path = Path::new("/home/user/.disclose/config.json");
        assert_eq!(
            resolve_skills_dir(&config, path),
            PathBuf::from("/repo/skills")
        );
    }

    #[test]
    fn explicit_skills_root_wins() {
        let config = Config::default();
        let path = Path::new("/home/user/.disclose/config.json");
        assert_eq!(
            resolve_skills_root(Some(PathBuf::from("/tmp/s")), &config, path),
            PathBuf::from("/tmp/s")
        );
    }

    #[test]
    fn load_config_missing_file_is_default() {
        let path = std::env::temp_dir()
            .join(format!("disclose-config-{}", uuid::Uuid::new_v4()))
            .join("config.json");
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.skills.invoke_timeout_secs, 30);
    }

    #[test]
    fn load_config_reports_parse_errors() {
        let dir = std::env::temp_dir().join(format!("disclose-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_config(Some(path)).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config"));
    }
}
