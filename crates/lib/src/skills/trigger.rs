//! Trigger hints: the phrases or patterns that decide whether a skill applies to a request.
//!
//! A plain hint is a literal phrase matched case-insensitively at word boundaries; any run of
//! whitespace in the input matches a space in the hint. A hint prefixed with `re:` is a
//! case-insensitive regular expression. Both are compiled once, at load time.

use regex::Regex;

/// Prefix marking a hint as a regular expression.
pub const PATTERN_PREFIX: &str = "re:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    Literal,
    Pattern,
}

/// One compiled trigger hint.
#[derive(Debug, Clone)]
pub struct TriggerHint {
    raw: String,
    kind: HintKind,
    regex: Regex,
    /// For literals: normalized phrase length in chars. Patterns score by matched length.
    literal_len: usize,
}

/// Where a hint matched in the input, and how specific the match was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintMatch {
    pub start: usize,
    pub end: usize,
    pub score: usize,
}

impl TriggerHint {
    /// Compile a hint as written in a manifest. Empty hints and invalid patterns are rejected.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if let Some(pattern) = raw.strip_prefix(PATTERN_PREFIX) {
            if pattern.trim().is_empty() {
                return Err(format!("empty trigger pattern {:?}", raw));
            }
            let regex = Regex::new(&format!("(?i){}", pattern))
                .map_err(|e| format!("invalid trigger pattern {:?}: {}", raw, e))?;
            return Ok(Self {
                raw: raw.to_string(),
                kind: HintKind::Pattern,
                regex,
                literal_len: 0,
            });
        }

        let words: Vec<&str> = raw.split_whitespace().collect();
        if words.is_empty() {
            return Err("empty trigger hint".to_string());
        }
        let phrase = words.join(" ");
        let body = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join(r"\s+");
        let leading = if phrase.chars().next().is_some_and(is_word_char) {
            r"\b"
        } else {
            ""
        };
        let trailing = if phrase.chars().last().is_some_and(is_word_char) {
            r"\b"
        } else {
            ""
        };
        let regex = Regex::new(&format!("(?i){}{}{}", leading, body, trailing))
            .map_err(|e| format!("invalid trigger hint {:?}: {}", raw, e))?;
        Ok(Self {
            raw: raw.to_string(),
            kind: HintKind::Literal,
            regex,
            literal_len: phrase.chars().count(),
        })
    }

    /// The hint exactly as declared.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> HintKind {
        self.kind
    }

    /// First non-empty match of this hint in `input`, if any. A pattern that only matches the
    /// empty string never selects a skill.
    pub fn find(&self, input: &str) -> Option<HintMatch> {
        let m = self.regex.find_iter(input).find(|m| m.start() < m.end())?;
        let score = match self.kind {
            HintKind::Literal => self.literal_len,
            HintKind::Pattern => m.as_str().chars().count(),
        };
        Some(HintMatch {
            start: m.start(),
            end: m.end(),
            score,
        })
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
