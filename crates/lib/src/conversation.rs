//! Conversation history for the assistant loop.
//!
//! A `Conversation` is an explicit context object: created at session start, appended once per
//! turn, and dropped (or replaced) when the session ends. It is passed into every turn rather than
//! held globally.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation. Assistant turns produced by a skill carry its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            skill: None,
        }
    }

    pub fn assistant(content: impl Into<String>, skill: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            skill,
        }
    }
}

/// Ordered, append-only message history with an opaque id.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: String,
    turns: Vec<Turn>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: format!("conv-{}", uuid::Uuid::new_v4()),
            turns: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The last `limit` turns, oldest first.
    pub fn recent(&self, limit: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(limit);
        &self.turns[start..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = Conversation::new();
        let b = Conversation::new();
        assert!(a.id().starts_with("conv-"));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let mut c = Conversation::new();
        for i in 0..5 {
            c.push(Turn::user(format!("m{}", i)));
        }
        let tail: Vec<_> = c.recent(2).iter().map(|t| t.content.as_str()).collect();
        assert_eq!(tail, vec!["m3", "m4"]);
        assert_eq!(c.recent(10).len(), 5);
        assert!(c.recent(0).is_empty());
    }

    #[test]
    fn turn_serializes_role_lowercase() {
        let json = serde_json::to_value(Turn::assistant("hi", Some("echo".to_string()))).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["skill"], "echo");
        let user = serde_json::to_value(Turn::user("yo")).unwrap();
        assert!(user.get("skill").is_none());
    }
}
