//! Skill descriptor: the immutable, invocable form of a loaded skill.
//!
//! The loader builds one `SkillDescriptor` per valid skill directory. Descriptors are shared as
//! `Arc<SkillDescriptor>` and never mutated; invocation goes through the `SkillHandler` bound at
//! load time.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::trigger::TriggerHint;
use crate::conversation::Turn;

/// Payload passed to a skill's entry point.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequest {
    /// Id of the skill being invoked.
    pub skill_id: String,
    /// The user's input, as typed.
    pub input: String,
    /// Input left after the matched trigger hint (or the whole input).
    pub argument: String,
    /// Recent conversation turns before this input.
    pub history: Vec<Turn>,
}

/// Why a skill invocation failed. Never fatal: the assistant falls back to the general reply path.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("skill failed: {0}")]
    Failed(String),
    #[error("skill timed out after {0:?}")]
    Timeout(Duration),
    #[error("skill panicked: {0}")]
    Panicked(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The single capability every skill implements.
#[async_trait]
pub trait SkillHandler: Send + Sync {
    async fn invoke(&self, request: &SkillRequest) -> Result<String, InvocationError>;
}

/// Declared entry point, as written in the manifest (`builtin:<name>`, `script:<name>`, `document`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoint {
    /// Handler compiled into this crate.
    Builtin(String),
    /// Script under the skill's `scripts/` directory.
    Script(String),
    /// The skill's SKILL.md documentation is its response.
    Document,
}

impl EntryPoint {
    pub fn parse(decl: &str) -> Result<Self, String> {
        let decl = decl.trim();
        if decl == "document" {
            return Ok(EntryPoint::Document);
        }
        let (kind, target) = decl
            .split_once(':')
            .ok_or_else(|| format!("unrecognized entry {:?} (expected builtin:<name>, script:<name> or document)", decl))?;
        let target = target.trim();
        if target.is_empty() {
            return Err(format!("entry {:?} names no target", decl));
        }
        match kind.trim() {
            "builtin" => Ok(EntryPoint::Builtin(target.to_string())),
            "script" => Ok(EntryPoint::Script(target.to_string())),
            other => Err(format!("unknown entry kind {:?}", other)),
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPoint::Builtin(name) => write!(f, "builtin:{}", name),
            EntryPoint::Script(name) => write!(f, "script:{}", name),
            EntryPoint::Document => f.write_str("document"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillSource {
    /// From the primary skills root.
    Root,
    /// From config.skills.extraDirs.
    Extra,
    /// Registered programmatically by the host.
    Embedded,
}

/// A loaded skill: metadata for disclosure plus its bound entry point.
#[derive(Clone)]
pub struct SkillDescriptor {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub trigger_hints: Vec<TriggerHint>,
    pub entry: EntryPoint,
    pub source: SkillSource,
    /// Skill directory (empty for embedded skills).
    pub path: PathBuf,
    /// SKILL.md body without frontmatter, when present.
    pub documentation: Option<String>,
    handler: Arc<dyn SkillHandler>,
}

impl SkillDescriptor {
    /// Build a descriptor around a handler. Used by the loader and by hosts that embed skills directly.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        entry: EntryPoint,
        handler: Arc<dyn SkillHandler>,
    ) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            description: description.into(),
            trigger_hints: Vec::new(),
            entry,
            source: SkillSource::Embedded,
            path: PathBuf::new(),
            documentation: None,
            handler,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_trigger_hints(mut self, hints: Vec<TriggerHint>) -> Self {
        self.trigger_hints = hints;
        self
    }

    pub fn with_location(mut self, path: PathBuf, source: SkillSource) -> Self {
        self.path = path;
        self.source = source;
        self
    }

    pub fn with_documentation(mut self, documentation: Option<String>) -> Self {
        self.documentation = documentation;
        self
    }

    /// Run the skill's entry point.
    pub async fn invoke(&self, request: &SkillRequest) -> Result<String, InvocationError> {
        self.handler.invoke(request).await
    }

    pub fn summary(&self) -> SkillSummary {
        SkillSummary {
            id: self.id.clone(),
            name: self.display_name.clone(),
            description: self.description.clone(),
        }
    }
}

impl fmt::Debug for SkillDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillDescriptor")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("entry", &self.entry)
            .field("source", &self.source)
            .field("path", &self.path)
            .field("hints", &self.trigger_hints.len())
            .finish()
    }
}

/// Compact metadata shown before a skill is used (name + description only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}
