//! Load skills from dirs: each skill is a subdirectory with `manifest.json` and/or `SKILL.md`
//! (YAML frontmatter + markdown).
//!
//! Candidates are visited in directory-name order, primary root first, then extra dirs. A broken
//! candidate is skipped with a warning and recorded in the registry's diagnostics; it never stops
//! the others from loading. Only an unreadable primary root is fatal.
//! Skills with `metadata.requires.bins` are only loaded when all listed binaries are on PATH.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::builtin::{self, BuiltinError};
use super::descriptor::{
    EntryPoint, InvocationError, SkillDescriptor, SkillHandler, SkillRequest, SkillSource,
};
use super::manifest::{documentation_body, Manifest, MANIFEST_FILE, SKILL_DOC_FILE};
use super::registry::SkillRegistry;
use super::script::ScriptHandler;
use super::trigger::TriggerHint;

/// Options that shape discovery; kept on the registry so `reload` repeats them.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Searched after the primary root; an id already loaded earlier wins.
    pub extra_dirs: Vec<PathBuf>,
    /// Skill ids to skip.
    pub disabled: Vec<String>,
    /// Bind `script:` entry points. When false, script skills are skipped as unavailable.
    pub allow_scripts: bool,
}

/// A skipped candidate. Logged and kept in `SkillRegistry::diagnostics`; never fatal.
#[derive(Debug, thiserror::Error)]
pub enum SkillLoadError {
    #[error("{}: no {} or {}", .dir.display(), MANIFEST_FILE, SKILL_DOC_FILE)]
    MissingManifest { dir: PathBuf },
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: malformed metadata: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("{}: no usable entry point: {reason}", .dir.display())]
    MissingEntryPoint { dir: PathBuf, reason: String },
    #[error("{}: initialization failed: {reason}", .dir.display())]
    Init { dir: PathBuf, reason: String },
    #[error("{}: unavailable: {reason}", .dir.display())]
    Unavailable { dir: PathBuf, reason: String },
    #[error("duplicate skill id {id:?} at {}; keeping {}", .dir.display(), .kept.display())]
    Duplicate {
        id: String,
        dir: PathBuf,
        kept: PathBuf,
    },
}

/// The primary skills root could not be read at all.
#[derive(Debug, thiserror::Error)]
#[error("cannot read skills directory {}: {source}", .path.display())]
pub struct RootError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Discover, validate, and bind every skill under `root` (and `options.extra_dirs`).
pub fn load_skills(root: &Path, options: &LoadOptions) -> Result<SkillRegistry, RootError> {
    let candidates = candidate_dirs(root).map_err(|source| RootError {
        path: root.to_path_buf(),
        source,
    })?;
    let mut registry = SkillRegistry::for_root(root, options);
    load_candidates(&mut registry, candidates, SkillSource::Root, options);

    for dir in &options.extra_dirs {
        match candidate_dirs(dir) {
            Ok(candidates) => load_candidates(&mut registry, candidates, SkillSource::Extra, options),
            Err(e) => log::warn!("skipping extra skills directory {}: {}", dir.display(), e),
        }
    }

    log::info!(
        "loaded {} skill(s) from {} ({} skipped)",
        registry.len(),
        root.display(),
        registry.diagnostics().len()
    );
    Ok(registry)
}

/// Re-run discovery with the root and options a registry was built from.
/// A registry built programmatically has no root; reloading it yields an empty registry.
pub fn reload(previous: &SkillRegistry) -> Result<SkillRegistry, RootError> {
    match previous.root() {
        Some(root) => load_skills(root, previous.options()),
        None => Ok(SkillRegistry::empty()),
    }
}

/// Non-hidden subdirectories of `dir`, sorted by name. Only failing to open `dir` is an error.
fn candidate_dirs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)?.map(|entry| entry.map(|e| e.path()));
    Ok(filter_candidates(dir, entries))
}

/// Keep visible directories; an entry that cannot be read is logged and skipped.
fn filter_candidates(
    dir: &Path,
    entries: impl IntoIterator<Item = std::io::Result<PathBuf>>,
) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = entries
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("skipping unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|path| path.is_dir())
        .filter(|path| {
            !path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'))
        })
        .collect();
    out.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    out
}

fn load_candidates(
    registry: &mut SkillRegistry,
    candidates: Vec<PathBuf>,
    source: SkillSource,
    options: &LoadOptions,
) {
    for dir in candidates {
        let result = load_candidate(&dir, source, options)
            .and_then(|d| d.map_or(Ok(()), |d| registry.insert(d)));
        if let Err(e) = result {
            log::warn!("skipping skill: {}", e);
            registry.record(e);
        }
    }
}

/// Load one skill directory. `Ok(None)` means the skill is disabled by config.
fn load_candidate(
    dir: &Path,
    source: SkillSource,
    options: &LoadOptions,
) -> Result<Option<SkillDescriptor>, SkillLoadError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let doc_path = dir.join(SKILL_DOC_FILE);
    let doc = read_optional(&doc_path)?;

    let (manifest, metadata_path) = if manifest_path.is_file() {
        let text = std::fs::read_to_string(&manifest_path).map_err(|source| SkillLoadError::Io {
            path: manifest_path.clone(),
            source,
        })?;
        let m = Manifest::from_json(&text).map_err(|reason| SkillLoadError::Malformed {
            path: manifest_path.clone(),
            reason,
        })?;
        (m, manifest_path)
    } else if let Some(ref content) = doc {
        let m = Manifest::from_skill_doc(content).map_err(|reason| SkillLoadError::Malformed {
            path: doc_path.clone(),
            reason,
        })?;
        (m, doc_path)
    } else {
        return Err(SkillLoadError::MissingManifest {
            dir: dir.to_path_buf(),
        });
    };
    let malformed = |reason: String| SkillLoadError::Malformed {
        path: metadata_path.clone(),
        reason,
    };

    let id = match manifest.identifier.as_deref() {
        Some(id) => id.trim().to_string(),
        None => dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| malformed("directory name is not valid UTF-8".to_string()))?
            .to_string(),
    };
    validate_id(&id).map_err(malformed)?;

    if options.disabled.iter().any(|d| d == &id) {
        log::debug!("skill {} is disabled by config", id);
        return Ok(None);
    }

    let description = manifest
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| malformed("missing description".to_string()))?
        .to_string();
    let display_name = manifest
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&id)
        .to_string();
    let trigger_hints = manifest
        .trigger_hints
        .iter()
        .map(|h| TriggerHint::parse(h))
        .collect::<Result<Vec<_>, _>>()
        .map_err(malformed)?;

    let bins = manifest.required_bins();
    let missing: Vec<&str> = bins
        .iter()
        .filter(|b| !bin_on_path(b))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(SkillLoadError::Unavailable {
            dir: dir.to_path_buf(),
            reason: format!("required binaries not on PATH: {}", missing.join(", ")),
        });
    }

    let decl = manifest
        .entry
        .as_deref()
        .ok_or_else(|| SkillLoadError::MissingEntryPoint {
            dir: dir.to_path_buf(),
            reason: "no entry declared".to_string(),
        })?;
    let entry = EntryPoint::parse(decl).map_err(malformed)?;
    let documentation = doc
        .as_deref()
        .map(documentation_body)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    let handler = bind_entry(&entry, dir, &manifest, documentation.as_deref(), options)?;

    log::debug!("loaded skill {} ({}) from {}", id, entry, dir.display());
    Ok(Some(
        SkillDescriptor::new(id, description, entry, handler)
            .with_display_name(display_name)
            .with_trigger_hints(trigger_hints)
            .with_location(dir.to_path_buf(), source)
            .with_documentation(documentation),
    ))
}

fn bind_entry(
    entry: &EntryPoint,
    dir: &Path,
    manifest: &Manifest,
    documentation: Option<&str>,
    options: &LoadOptions,
) -> Result<Arc<dyn SkillHandler>, SkillLoadError> {
    match entry {
        EntryPoint::Builtin(name) => {
            builtin::instantiate(name, &manifest.options).map_err(|e| match e {
                BuiltinError::Unknown(_) => SkillLoadError::MissingEntryPoint {
                    dir: dir.to_path_buf(),
                    reason: format!(
                        "{} (known: {})",
                        e,
                        builtin::builtin_names().collect::<Vec<_>>().join(", ")
                    ),
                },
                BuiltinError::Options { .. } => SkillLoadError::Init {
                    dir: dir.to_path_buf(),
                    reason: e.to_string(),
                },
            })
        }
        EntryPoint::Script(name) => {
            if !options.allow_scripts {
                return Err(SkillLoadError::Unavailable {
                    dir: dir.to_path_buf(),
                    reason: "script entry points are disabled (skills.allowScripts)".to_string(),
                });
            }
            let handler = ScriptHandler::resolve(dir, name).map_err(|reason| {
                SkillLoadError::MissingEntryPoint {
                    dir: dir.to_path_buf(),
                    reason,
                }
            })?;
            log::debug!("bound script {}", handler.script_path().display());
            Ok(Arc::new(handler))
        }
        EntryPoint::Document => {
            let text = documentation.ok_or_else(|| SkillLoadError::MissingEntryPoint {
                dir: dir.to_path_buf(),
                reason: format!("document entry needs a non-empty {}", SKILL_DOC_FILE),
            })?;
            Ok(Arc::new(DocumentHandler {
                text: text.to_string(),
            }))
        }
    }
}

/// `entry: document`: the skill's documentation is its answer.
struct DocumentHandler {
    text: String,
}

#[async_trait]
impl SkillHandler for DocumentHandler {
    async fn invoke(&self, _request: &SkillRequest) -> Result<String, InvocationError> {
        Ok(self.text.clone())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, SkillLoadError> {
    if !path.is_file() {
        return Ok(None);
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|source| SkillLoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn validate_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("identifier is empty".to_string());
    }
    if id.chars().any(char::is_whitespace) {
        return Err(format!("identifier {:?} contains whitespace", id));
    }
    Ok(())
}

/// Returns true if the given binary name is found on PATH (or has path separators and exists).
fn bin_on_path(bin: &str) -> bool {
    if bin.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(bin).is_file();
    }
    let Some(path_var) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path_var).any(|dir| {
        if dir.as_os_str().is_empty() {
            return false;
        }
        if dir.join(bin).is_file() {
            return true;
        }
        cfg!(windows) && dir.join(format!("{}.exe", bin)).is_file()
    })
}
