//! Assistant turn: pick at most one skill for the input, invoke it in isolation, or fall back to
//! the reasoner. A turn always produces a reply; skill failures become diagnostics, not errors.

use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::conversation::{Conversation, Turn};
use crate::reasoner::{Decision, Reasoner};
use crate::skills::{self, InvocationError, RootError, SkillDescriptor, SkillRegistry, SkillRequest};

/// Reply used when neither a skill nor the reasoner produced one.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't come up with a response to that.";

const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct AssistantOptions {
    /// Deadline for one skill invocation; exceeding it is an `InvocationError::Timeout`.
    pub invoke_timeout: Duration,
    /// How many prior turns are passed to skills and the reasoner.
    pub history_limit: usize,
}

impl Default for AssistantOptions {
    fn default() -> Self {
        Self {
            invoke_timeout: DEFAULT_INVOKE_TIMEOUT,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    Skill(String),
    General,
}

/// A skill that was selected but failed during this turn.
#[derive(Debug)]
pub struct SkillFailure {
    pub skill: String,
    pub error: InvocationError,
}

/// Result of one turn.
#[derive(Debug)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
    pub failure: Option<SkillFailure>,
}

impl Reply {
    fn general(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: ReplySource::General,
            failure: None,
        }
    }

    /// Id of the skill that produced this reply, if any.
    pub fn skill(&self) -> Option<&str> {
        match &self.source {
            ReplySource::Skill(id) => Some(id),
            ReplySource::General => None,
        }
    }

    /// Reply text, prefixed with `[skill]` when attribution is wanted and a skill answered.
    pub fn render(&self, attribution: bool) -> String {
        match (&self.source, attribution) {
            (ReplySource::Skill(id), true) => format!("[{}] {}", id, self.text),
            _ => self.text.clone(),
        }
    }
}

/// Dispatches requests to skills. Holds the registry behind an `Arc` so a reload swaps it without
/// touching turns already running against the previous one.
pub struct Assistant<R> {
    registry: RwLock<Arc<SkillRegistry>>,
    reasoner: R,
    options: AssistantOptions,
}

impl<R: Reasoner> Assistant<R> {
    pub fn new(registry: SkillRegistry, reasoner: R, options: AssistantOptions) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            reasoner,
            options,
        }
    }

    /// Snapshot of the current registry.
    pub async fn registry(&self) -> Arc<SkillRegistry> {
        Arc::clone(&*self.registry.read().await)
    }

    /// Re-run discovery and swap the registry in. On error the current registry stays.
    pub async fn reload(&self) -> Result<Arc<SkillRegistry>, RootError> {
        let current = self.registry().await;
        let fresh = Arc::new(skills::reload(&current)?);
        *self.registry.write().await = Arc::clone(&fresh);
        log::info!("reloaded skills: {} loaded", fresh.len());
        Ok(fresh)
    }

    /// Run one turn. Explicit `$id` references win, then trigger hints, then the reasoner.
    pub async fn handle_request(&self, conversation: &mut Conversation, input: &str) -> Reply {
        let registry = self.registry().await;
        let history = conversation.recent(self.options.history_limit).to_vec();
        conversation.push(Turn::user(input));

        let selection = registry
            .select_explicit(input)
            .or_else(|| registry.select(input));
        let reply = match selection {
            Some(sel) => {
                log::debug!("turn: {:?} selected {} via {:?}", input, sel.skill.id, sel.hint);
                self.run_skill(&registry, &sel.skill, input, sel.argument, history)
                    .await
            }
            None => self.general(&registry, input, history, true).await,
        };
        conversation.push(Turn::assistant(reply.text.clone(), reply.skill().map(str::to_string)));
        reply
    }

    /// Invoke a skill by id (e.g. `/use echo hi`). Unknown ids get a general reply.
    pub async fn invoke_skill(
        &self,
        conversation: &mut Conversation,
        id: &str,
        argument: &str,
    ) -> Reply {
        let registry = self.registry().await;
        let history = conversation.recent(self.options.history_limit).to_vec();
        let argument = argument.trim();
        let input = format!("${} {}", id, argument).trim_end().to_string();
        conversation.push(Turn::user(input.clone()));

        let reply = match registry.get(id) {
            Some(skill) => {
                self.run_skill(&registry, &skill, &input, argument.to_string(), history)
                    .await
            }
            None => {
                let known: Vec<&str> = registry.ids().collect();
                Reply::general(if known.is_empty() {
                    format!("Unknown skill '{}'. No skills are installed.", id)
                } else {
                    format!("Unknown skill '{}'. Available: {}", id, known.join(", "))
                })
            }
        };
        conversation.push(Turn::assistant(reply.text.clone(), reply.skill().map(str::to_string)));
        reply
    }

    async fn run_skill(
        &self,
        registry: &SkillRegistry,
        skill: &SkillDescriptor,
        input: &str,
        argument: String,
        history: Vec<Turn>,
    ) -> Reply {
        let request = SkillRequest {
            skill_id: skill.id.clone(),
            input: input.to_string(),
            argument,
            history,
        };
        match self.invoke_isolated(skill, &request).await {
            Ok(text) => Reply {
                text,
                source: ReplySource::Skill(skill.id.clone()),
                failure: None,
            },
            Err(error) => {
                log::warn!("skill {} failed: {}", skill.id, error);
                let mut reply = self.general(registry, input, request.history, false).await;
                reply.failure = Some(SkillFailure {
                    skill: skill.id.clone(),
                    error,
                });
                reply
            }
        }
    }

    /// Invoke with the configured deadline; panics in the handler become errors.
    async fn invoke_isolated(
        &self,
        skill: &SkillDescriptor,
        request: &SkillRequest,
    ) -> Result<String, InvocationError> {
        let call = AssertUnwindSafe(skill.invoke(request)).catch_unwind();
        match tokio::time::timeout(self.options.invoke_timeout, call).await {
            Err(_) => Err(InvocationError::Timeout(self.options.invoke_timeout)),
            Ok(Err(panic)) => Err(InvocationError::Panicked(panic_message(panic.as_ref()))),
            Ok(Ok(result)) => result,
        }
    }

    /// General path: ask the reasoner. When `allow_skill` is false (after a skill already failed
    /// this turn) a skill recommendation is not followed.
    async fn general(
        &self,
        registry: &SkillRegistry,
        input: &str,
        history: Vec<Turn>,
        allow_skill: bool,
    ) -> Reply {
        let catalog = registry.catalog();
        let decision = match self.reasoner.respond(input, &history, &catalog).await {
            Ok(d) => d,
            Err(e) => {
                log::warn!("reasoner failed: {}", e);
                return Reply::general(FALLBACK_REPLY);
            }
        };
        match decision {
            Decision::Respond(text) => Reply::general(text),
            Decision::UseSkill { id, argument } => {
                if !allow_skill {
                    log::debug!("ignoring reasoner recommendation {} after skill failure", id);
                    return Reply::general(FALLBACK_REPLY);
                }
                match registry.get(&id) {
                    Some(skill) => {
                        let request = SkillRequest {
                            skill_id: skill.id.clone(),
                            input: input.to_string(),
                            argument,
                            history,
                        };
                        match self.invoke_isolated(&skill, &request).await {
                            Ok(text) => Reply {
                                text,
                                source: ReplySource::Skill(skill.id.clone()),
                                failure: None,
                            },
                            Err(error) => {
                                log::warn!("skill {} failed: {}", skill.id, error);
                                Reply {
                                    text: FALLBACK_REPLY.to_string(),
                                    source: ReplySource::General,
                                    failure: Some(SkillFailure {
                                        skill: skill.id.clone(),
                                        error,
                                    }),
                                }
                            }
                        }
                    }
                    None => {
                        log::warn!("reasoner recommended unknown skill {}", id);
                        Reply::general(FALLBACK_REPLY)
                    }
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_attribution() {
        let reply = Reply {
            text: "hello".to_string(),
            source: ReplySource::Skill("echo".to_string()),
            failure: None,
        };
        assert_eq!(reply.render(true), "[echo] hello");
        assert_eq!(reply.render(false), "hello");
        assert_eq!(Reply::general("hi").render(true), "hi");
    }

    #[test]
    fn panic_messages() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&"bang".to_string()), "bang");
        assert_eq!(panic_message(&42u8), "unknown panic");
    }
}
