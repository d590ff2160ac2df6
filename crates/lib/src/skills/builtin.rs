//! Handlers compiled into the crate, bound by `entry: builtin:<name>`.
//!
//! Each builtin is a factory that reads the manifest's `options` and returns a handler. Factories
//! only validate and configure; nothing user-visible happens until `invoke`.

use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::sync::Arc;

use super::descriptor::{InvocationError, SkillHandler, SkillRequest};

type Factory = fn(&serde_json::Value) -> Result<Arc<dyn SkillHandler>, String>;

const BUILTINS: &[(&str, Factory)] = &[("clock", clock), ("count", count), ("echo", echo)];

#[derive(Debug, thiserror::Error)]
pub enum BuiltinError {
    #[error("unknown builtin {0:?}")]
    Unknown(String),
    #[error("builtin {name:?} rejected its options: {reason}")]
    Options { name: String, reason: String },
}

/// Names of all builtins, sorted.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

/// Bind a builtin by name with the manifest's options.
pub fn instantiate(
    name: &str,
    options: &serde_json::Value,
) -> Result<Arc<dyn SkillHandler>, BuiltinError> {
    let (_, factory) = BUILTINS
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| BuiltinError::Unknown(name.to_string()))?;
    factory(options).map_err(|reason| BuiltinError::Options {
        name: name.to_string(),
        reason,
    })
}

fn parse_options<T: for<'de> Deserialize<'de> + Default>(
    options: &serde_json::Value,
) -> Result<T, String> {
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(|e| e.to_string())
}

/// Returns the argument unchanged.
struct Echo;

#[async_trait]
impl SkillHandler for Echo {
    async fn invoke(&self, request: &SkillRequest) -> Result<String, InvocationError> {
        Ok(request.argument.clone())
    }
}

fn echo(options: &serde_json::Value) -> Result<Arc<dyn SkillHandler>, String> {
    if !options.is_null() && options.as_object().map_or(true, |o| !o.is_empty()) {
        return Err("echo takes no options".to_string());
    }
    Ok(Arc::new(Echo))
}

const DEFAULT_CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ClockOptions {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    utc: bool,
}

/// Current date and time, local or UTC.
struct Clock {
    format: String,
    utc: bool,
}

#[async_trait]
impl SkillHandler for Clock {
    async fn invoke(&self, _request: &SkillRequest) -> Result<String, InvocationError> {
        let now = if self.utc {
            chrono::Utc::now().format(&self.format).to_string()
        } else {
            chrono::Local::now().format(&self.format).to_string()
        };
        Ok(now)
    }
}

fn clock(options: &serde_json::Value) -> Result<Arc<dyn SkillHandler>, String> {
    let opts: ClockOptions = parse_options(options)?;
    let format = opts
        .format
        .unwrap_or_else(|| DEFAULT_CLOCK_FORMAT.to_string());
    if format.trim().is_empty() {
        return Err("format is empty".to_string());
    }
    if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid strftime format {:?}", format));
    }
    Ok(Arc::new(Clock {
        format,
        utc: opts.utc,
    }))
}

/// Word and character counts of the argument.
struct Count;

#[async_trait]
impl SkillHandler for Count {
    async fn invoke(&self, request: &SkillRequest) -> Result<String, InvocationError> {
        let text = request.argument.trim();
        if text.is_empty() {
            return Err(InvocationError::InvalidRequest(
                "nothing to count".to_string(),
            ));
        }
        let words = text.split_whitespace().count();
        let chars = text.chars().count();
        Ok(format!(
            "{} word{}, {} character{}",
            words,
            if words == 1 { "" } else { "s" },
            chars,
            if chars == 1 { "" } else { "s" }
        ))
    }
}

fn count(options: &serde_json::Value) -> Result<Arc<dyn SkillHandler>, String> {
    echo(options).map_err(|_| "count takes no options".to_string())?;
    Ok(Arc::new(Count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(argument: &str) -> SkillRequest {
        SkillRequest {
            skill_id: "test".to_string(),
            input: argument.to_string(),
            argument: argument.to_string(),
            history: Vec::new(),
        }
    }

    #[tokio::test]
    async fn echo_returns_argument() {
        let h = instantiate("echo", &serde_json::Value::Null).unwrap();
        assert_eq!(h.invoke(&request("hello")).await.unwrap(), "hello");
        assert_eq!(h.invoke(&request("")).await.unwrap(), "");
    }

    #[tokio::test]
    async fn clock_uses_configured_format() {
        let h = instantiate("clock", &json!({ "format": "%Y", "utc": true })).unwrap();
        let out = h.invoke(&request("")).await.unwrap();
        assert_eq!(out, chrono::Utc::now().format("%Y").to_string());
    }

    #[test]
    fn clock_rejects_bad_options() {
        assert!(matches!(
            instantiate("clock", &json!({ "format": "%Q" })),
            Err(BuiltinError::Options { .. })
        ));
        assert!(matches!(
            instantiate("clock", &json!({ "zone": "UTC" })),
            Err(BuiltinError::Options { .. })
        ));
    }

    #[tokio::test]
    async fn count_words_and_chars() {
        let h = instantiate("count", &serde_json::Value::Null).unwrap();
        assert_eq!(
            h.invoke(&request("hello big world")).await.unwrap(),
            "3 words, 15 characters"
        );
        assert_eq!(h.invoke(&request("a")).await.unwrap(), "1 word, 1 character");
        assert!(matches!(
            h.invoke(&request("   ")).await,
            Err(InvocationError::InvalidRequest(_))
        ));
    }

    #[test]
    fn unknown_builtin() {
        assert!(matches!(
            instantiate("teleport", &serde_json::Value::Null),
            Err(BuiltinError::Unknown(_))
        ));
        assert_eq!(builtin_names().collect::<Vec<_>>(), vec!["clock", "count", "echo"]);
    }
}
