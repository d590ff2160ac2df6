//! Reasoning collaborator: the general response path used when no skill's triggers match.
//!
//! The collaborator sees the input, recent history, and only the compact skill catalog. It either
//! answers directly or recommends a skill by id. `OfflineReasoner` is a deterministic stand-in
//! that needs no model.

use async_trait::async_trait;
use std::sync::OnceLock;

use crate::conversation::Turn;
use crate::disclosure::format_catalog;
use crate::skills::{SkillSummary, TriggerHint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Answer directly.
    Respond(String),
    /// Invoke the named skill with this argument.
    UseSkill { id: String, argument: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ReasonerError {
    #[error("reasoner unavailable: {0}")]
    Unavailable(String),
    #[error("reasoner failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn respond(
        &self,
        input: &str,
        history: &[Turn],
        skills: &[SkillSummary],
    ) -> Result<Decision, ReasonerError>;
}

const HELP_PHRASES: &[&str] = &[
    "help",
    "what can you do",
    "what skills",
    "list skills",
    "show skills",
    "which skills",
];

/// Help phrases compiled once, matched on word boundaries like trigger hints.
fn help_hints() -> &'static [TriggerHint] {
    static HINTS: OnceLock<Vec<TriggerHint>> = OnceLock::new();
    HINTS.get_or_init(|| {
        HELP_PHRASES
            .iter()
            .filter_map(|p| TriggerHint::parse(p).ok())
            .collect()
    })
}

/// Answers help-style questions with the skill catalog and everything else with a pointer to it.
#[derive(Debug, Clone, Default)]
pub struct OfflineReasoner;

#[async_trait]
impl Reasoner for OfflineReasoner {
    async fn respond(
        &self,
        input: &str,
        _history: &[Turn],
        skills: &[SkillSummary],
    ) -> Result<Decision, ReasonerError> {
        if help_hints().iter().any(|h| h.find(input).is_some()) {
            return Ok(Decision::Respond(format_catalog(skills).trim_end().to_string()));
        }
        let reply = if skills.is_empty() {
            "I don't have a skill for that, and no skills are installed.".to_string()
        } else {
            "I don't have a skill for that. Type /skills to see what I can do.".to_string()
        };
        Ok(Decision::Respond(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<SkillSummary> {
        vec![SkillSummary {
            id: "echo".to_string(),
            name: "Echo".to_string(),
            description: "Repeats text.".to_string(),
        }]
    }

    #[tokio::test]
    async fn help_lists_catalog() {
        let d = OfflineReasoner
            .respond("What can you do?", &[], &catalog())
            .await
            .unwrap();
        assert_eq!(
            d,
            Decision::Respond("Available skills:\n- echo (Echo): Repeats text.".to_string())
        );
    }

    #[tokio::test]
    async fn help_words_match_whole_words_only() {
        for input in ["help", "Can you HELP me?", "which   skills are there"] {
            let d = OfflineReasoner.respond(input, &[], &catalog()).await.unwrap();
            assert!(
                matches!(&d, Decision::Respond(t) if t.starts_with("Available skills:")),
                "{:?} -> {:?}",
                input,
                d
            );
        }
        for input in ["that was unhelpful", "I need a helper script"] {
            let Decision::Respond(text) = OfflineReasoner.respond(input, &[], &catalog()).await.unwrap()
            else {
                panic!("offline reasoner never recommends skills");
            };
            assert!(!text.starts_with("Available skills:"), "{:?} -> {:?}", input, text);
        }
    }

    #[tokio::test]
    async fn other_input_points_at_catalog() {
        let Decision::Respond(text) = OfflineReasoner
            .respond("what is the weather", &[], &catalog())
            .await
            .unwrap()
        else {
            panic!("offline reasoner never recommends skills");
        };
        assert!(text.contains("/skills"));
    }
}
