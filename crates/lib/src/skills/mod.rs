//! Skills: discover skill directories, validate their metadata, bind their entry points.
//!
//! A skill is a directory with `manifest.json` or a `SKILL.md` with YAML frontmatter. Skills load
//! from the configured skill root and any `skills.extraDirs`; on duplicate ids the first wins.
//! The result is an immutable `SkillRegistry`.

mod builtin;
mod descriptor;
mod loader;
mod manifest;
mod registry;
mod script;
mod trigger;

pub use builtin::builtin_names;
pub use descriptor::{
    EntryPoint, InvocationError, SkillDescriptor, SkillHandler, SkillRequest, SkillSource,
    SkillSummary,
};
pub use loader::{load_skills, reload, LoadOptions, RootError, SkillLoadError};
pub use manifest::{documentation_body, MANIFEST_FILE, SKILL_DOC_FILE};
pub use registry::{Selection, SkillRegistry};
pub use trigger::{HintKind, TriggerHint};
