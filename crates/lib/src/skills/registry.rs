//! Skill registry: identifier -> descriptor, built once and queried read-only.
//!
//! Iteration order is lexicographic by identifier, which is also the tie-break order for
//! trigger matching: when two skills match equally well, the first one wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::descriptor::{SkillDescriptor, SkillSummary};
use super::loader::{LoadOptions, SkillLoadError};

/// The skill chosen for an input, and the argument to pass it.
#[derive(Debug, Clone)]
pub struct Selection {
    pub skill: Arc<SkillDescriptor>,
    /// The hint that matched (as declared), or `$<id>` for explicit references.
    pub hint: String,
    pub argument: String,
}

#[derive(Debug, Default)]
pub struct SkillRegistry {
    skills: BTreeMap<String, Arc<SkillDescriptor>>,
    diagnostics: Vec<SkillLoadError>,
    root: Option<PathBuf>,
    options: LoadOptions,
}

impl SkillRegistry {
    /// Registry with no skills (the assistant still runs; every request takes the general path).
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn for_root(root: &Path, options: &LoadOptions) -> Self {
        Self {
            root: Some(root.to_path_buf()),
            options: options.clone(),
            ..Self::default()
        }
    }

    /// Build from descriptors the host constructed itself. Duplicates keep the first and are
    /// recorded in `diagnostics()`.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = SkillDescriptor>) -> Self {
        let mut registry = Self::empty();
        for d in descriptors {
            if let Err(e) = registry.insert(d) {
                log::warn!("skipping skill: {}", e);
                registry.record(e);
            }
        }
        registry
    }

    /// Insert a descriptor unless its id is taken (first wins).
    pub(crate) fn insert(&mut self, descriptor: SkillDescriptor) -> Result<(), SkillLoadError> {
        if let Some(kept) = self.skills.get(&descriptor.id) {
            return Err(SkillLoadError::Duplicate {
                id: descriptor.id.clone(),
                dir: descriptor.path.clone(),
                kept: kept.path.clone(),
            });
        }
        self.skills
            .insert(descriptor.id.clone(), Arc::new(descriptor));
        Ok(())
    }

    pub(crate) fn record(&mut self, error: SkillLoadError) {
        self.diagnostics.push(error);
    }

    pub fn get(&self, id: &str) -> Option<Arc<SkillDescriptor>> {
        self.skills.get(id).cloned()
    }

    /// Find a skill by what a user typed: exact id, then exact display name, then either one
    /// ignoring case and surrounding whitespace.
    pub fn lookup(&self, query: &str) -> Option<Arc<SkillDescriptor>> {
        if let Some(skill) = self.get(query) {
            return Some(skill);
        }
        if let Some(skill) = self.skills.values().find(|s| s.display_name == query) {
            return Some(Arc::clone(skill));
        }
        let lowered = query.trim().to_lowercase();
        self.skills
            .values()
            .find(|s| {
                s.id.to_lowercase() == lowered || s.display_name.trim().to_lowercase() == lowered
            })
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.skills.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Identifiers in registry order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.skills.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SkillDescriptor>> {
        self.skills.values()
    }

    /// Candidates skipped while building this registry.
    pub fn diagnostics(&self) -> &[SkillLoadError] {
        &self.diagnostics
    }

    /// Root directory this registry was loaded from (None when built programmatically).
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Name + description of every skill, for disclosure.
    pub fn catalog(&self) -> Vec<SkillSummary> {
        self.skills.values().map(|s| s.summary()).collect()
    }

    /// Pick at most one skill for `input`.
    ///
    /// Each skill scores as its best hint (literal: phrase length; pattern: matched length). The
    /// highest score wins; ties go to the earlier skill in registry order, and within a skill to
    /// the earlier hint. When the winning match starts the input, the rest of the input is the
    /// argument; otherwise the whole input is.
    pub fn select(&self, input: &str) -> Option<Selection> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        let mut best: Option<(usize, &Arc<SkillDescriptor>, &str, usize, usize)> = None;
        for skill in self.skills.values() {
            for hint in &skill.trigger_hints {
                let Some(m) = hint.find(text) else { continue };
                if best.as_ref().map_or(true, |(score, ..)| m.score > *score) {
                    best = Some((m.score, skill, hint.as_str(), m.start, m.end));
                }
            }
        }
        let (_, skill, hint, start, end) = best?;
        let argument = if start == 0 {
            text[end..].trim()
        } else {
            text
        };
        Some(Selection {
            skill: Arc::clone(skill),
            hint: hint.to_string(),
            argument: argument.to_string(),
        })
    }

    /// Explicit `$<id> rest` reference. None when the input is not one or names no loaded skill.
    pub fn select_explicit(&self, input: &str) -> Option<Selection> {
        let text = input.trim();
        let rest = text.strip_prefix('$')?;
        let (id, argument) = match rest.split_once(char::is_whitespace) {
            Some((id, argument)) => (id, argument.trim()),
            None => (rest, ""),
        };
        let skill = self.get(id)?;
        Some(Selection {
            skill,
            hint: format!("${}", id),
            argument: argument.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::descriptor::{EntryPoint, InvocationError, SkillHandler, SkillRequest};
    use crate::skills::trigger::TriggerHint;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl SkillHandler for Noop {
        async fn invoke(&self, _request: &SkillRequest) -> Result<String, InvocationError> {
            Ok(String::new())
        }
    }

    fn skill(id: &str, hints: &[&str]) -> SkillDescriptor {
        SkillDescriptor::new(id, format!("{} skill", id), EntryPoint::Document, Arc::new(Noop))
            .with_trigger_hints(hints.iter().map(|h| TriggerHint::parse(h).unwrap()).collect())
    }

    #[test]
    fn leading_hint_is_stripped_from_argument() {
        let r = SkillRegistry::from_descriptors([skill("echo", &["echo"])]);
        let sel = r.select("  echo hello world ").unwrap();
        assert_eq!(sel.skill.id, "echo");
        assert_eq!(sel.hint, "echo");
        assert_eq!(sel.argument, "hello world");
    }

    #[test]
    fn hint_inside_input_keeps_whole_input() {
        let r = SkillRegistry::from_descriptors([skill("clock", &["what time"])]);
        let sel = r.select("hey, what time is it?").unwrap();
        assert_eq!(sel.argument, "hey, what time is it?");
    }

    #[test]
    fn no_match_selects_nothing() {
        let r = SkillRegistry::from_descriptors([skill("echo", &["echo"])]);
        assert!(r.select("what is the weather").is_none());
        assert!(r.select("   ").is_none());
        assert!(SkillRegistry::empty().select("echo hi").is_none());
    }

    #[test]
    fn optional_pattern_does_not_capture_unrelated_input() {
        let r = SkillRegistry::from_descriptors([
            skill("greedy", &["re:(hello)?"]),
            skill("echo", &["echo"]),
        ]);
        assert!(r.select("what is the weather").is_none());
        assert_eq!(r.select("echo hi").unwrap().skill.id, "echo");
        assert_eq!(r.select("hello world").unwrap().skill.id, "greedy");
    }

    #[test]
    fn more_specific_hint_wins() {
        let r = SkillRegistry::from_descriptors([
            skill("alpha", &["time"]),
            skill("beta", &["what time"]),
        ]);
        assert_eq!(r.select("what time is it").unwrap().skill.id, "beta");
    }

    #[test]
    fn ties_go_to_first_in_registry_order() {
        // Inserted out of order; registry order is by id.
        let r = SkillRegistry::from_descriptors([
            skill("zulu", &["note"]),
            skill("alpha", &["note"]),
            skill("mike", &["note"]),
        ]);
        assert_eq!(r.ids().collect::<Vec<_>>(), vec!["alpha", "mike", "zulu"]);
        for _ in 0..3 {
            assert_eq!(r.select("note this down").unwrap().skill.id, "alpha");
        }
    }

    #[test]
    fn duplicates_keep_first_and_record_diagnostic() {
        let first = skill("echo", &["echo"]).with_display_name("First");
        let second = skill("echo", &["repeat"]).with_display_name("Second");
        let r = SkillRegistry::from_descriptors([first, second]);
        assert_eq!(r.len(), 1);
        assert_eq!(r.get("echo").unwrap().display_name, "First");
        assert!(matches!(
            r.diagnostics(),
            [SkillLoadError::Duplicate { id, .. }] if id == "echo"
        ));
    }

    #[test]
    fn lookup_by_id_then_display_name() {
        let r = SkillRegistry::from_descriptors([
            skill("clock", &[]).with_display_name("World Clock"),
            skill("echo", &[]).with_display_name("Echo"),
            skill("Echo", &[]).with_display_name("Shout"),
        ]);
        assert_eq!(r.lookup("clock").unwrap().id, "clock");
        assert_eq!(r.lookup("World Clock").unwrap().id, "clock");
        assert_eq!(r.lookup(" world clock ").unwrap().id, "clock");
        // Exact id beats another skill's display name.
        assert_eq!(r.lookup("Echo").unwrap().id, "Echo");
        assert_eq!(r.lookup("SHOUT").unwrap().id, "Echo");
        assert!(r.lookup("missing").is_none());
    }

    #[test]
    fn explicit_reference() {
        let r = SkillRegistry::from_descriptors([skill("count", &[])]);
        let sel = r.select_explicit("$count one two").unwrap();
        assert_eq!(sel.skill.id, "count");
        assert_eq!(sel.argument, "one two");
        assert_eq!(r.select_explicit("$count").unwrap().argument, "");
        assert!(r.select_explicit("$missing x").is_none());
        assert!(r.select_explicit("count x").is_none());
    }

    #[test]
    fn catalog_lists_in_order() {
        let r = SkillRegistry::from_descriptors([skill("b", &[]), skill("a", &[])]);
        let ids: Vec<_> = r.catalog().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
