//! In-memory provider with scripted replies and artificial latency.
//!
//! Backs `generate --dry-run` and the orchestrator tests. Replies are
//! chosen by the first rule whose needle occurs in the request's message
//! text; requests matching no rule get a placeholder reply.

use std::time::Duration;

use parking_lot::Mutex;
use rw_domain::error::{Error, Result};
use rw_domain::message::joined_text;
use rw_domain::usage::{Usage, UsageReport};

use crate::traits::{ChatRequest, ChatResponse, LlmProvider};

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Fail { status: u16, message: String },
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Started,
    Finished,
}

/// One dispatch or completion, in the order they happened.
#[derive(Debug, Clone)]
pub struct CallEvent {
    pub phase: CallPhase,
    pub model: String,
    pub prompt: String,
}

#[derive(Debug)]
struct Rule {
    needle: String,
    reply: ScriptedReply,
    latency: Duration,
    remaining: Option<usize>,
}

pub struct ScriptedProvider {
    model: String,
    default_latency: Duration,
    usage: Option<Usage>,
    rules: Mutex<Vec<Rule>>,
    events: Mutex<Vec<CallEvent>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new("gpt-4o")
    }
}

impl ScriptedProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            default_latency: Duration::ZERO,
            usage: None,
            rules: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Report this usage on every successful reply instead of leaving it
    /// unreported.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_default_latency(mut self, latency: Duration) -> Self {
        self.default_latency = latency;
        self
    }

    pub fn reply(self, needle: impl Into<String>, text: impl Into<String>) -> Self {
        self.push(needle, ScriptedReply::Text(text.into()), None, None)
    }

    pub fn reply_after(self, needle: impl Into<String>, text: impl Into<String>, latency: Duration) -> Self {
        self.push(needle, ScriptedReply::Text(text.into()), Some(latency), None)
    }

    pub fn fail(self, needle: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        let reply = ScriptedReply::Fail {
            status,
            message: message.into(),
        };
        self.push(needle, reply, None, None)
    }

    /// Fail the next matching call only; later calls fall through.
    pub fn fail_once(self, needle: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        let reply = ScriptedReply::Fail {
            status,
            message: message.into(),
        };
        self.push(needle, reply, None, Some(1))
    }

    pub fn empty(self, needle: impl Into<String>) -> Self {
        self.push(needle, ScriptedReply::Empty, None, None)
    }

    fn push(
        self,
        needle: impl Into<String>,
        reply: ScriptedReply,
        latency: Option<Duration>,
        remaining: Option<usize>,
    ) -> Self {
        self.rules.lock().push(Rule {
            needle: needle.into(),
            reply,
            latency: latency.unwrap_or(self.default_latency),
            remaining,
        });
        self
    }

    /// Every dispatch and completion seen so far.
    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().clone()
    }

    /// Prompts of dispatched calls, in dispatch order.
    pub fn dispatched(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.phase == CallPhase::Started)
            .map(|e| e.prompt.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.dispatched().len()
    }

    fn select(&self, prompt: &str) -> (ScriptedReply, Duration) {
        let mut rules = self.rules.lock();
        let hit = rules
            .iter_mut()
            .find(|r| r.remaining != Some(0) && prompt.contains(&r.needle));
        match hit {
            Some(rule) => {
                if let Some(n) = rule.remaining.as_mut() {
                    *n -= 1;
                }
                (rule.reply.clone(), rule.latency)
            }
            None => (placeholder(prompt), self.default_latency),
        }
    }

    fn record(&self, phase: CallPhase, model: &str, prompt: &str) {
        self.events.lock().push(CallEvent {
            phase,
            model: model.to_string(),
            prompt: prompt.to_string(),
        });
    }
}

fn placeholder(prompt: &str) -> ScriptedReply {
    ScriptedReply::Text(format!(
        "Placeholder content ({} prompt characters).",
        prompt.chars().count()
    ))
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let model = req.model.clone().unwrap_or_else(|| self.model.clone());
        let prompt = joined_text(&req.messages);
        let (reply, latency) = self.select(&prompt);

        self.record(CallPhase::Started, &model, &prompt);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.record(CallPhase::Finished, &model, &prompt);

        match reply {
            ScriptedReply::Text(content) => Ok(ChatResponse {
                content,
                usage: UsageReport::from_option(self.usage),
                model,
            }),
            ScriptedReply::Fail { status, message } => Err(Error::Provider {
                provider: "scripted".into(),
                status: Some(status),
                message,
            }),
            ScriptedReply::Empty => Err(Error::EmptyResponse),
        }
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rw_domain::message::Message;

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let p = ScriptedProvider::default()
            .reply("alpha", "A")
            .reply("a", "generic");
        let resp = p.chat(&ChatRequest::new(vec![Message::user("alpha beta")])).await.unwrap();
        assert_eq!(resp.content, "A");
        assert_eq!(resp.usage, UsageReport::Unreported);
    }

    #[tokio::test]
    async fn fail_once_then_fall_through() {
        let p = ScriptedProvider::default()
            .fail_once("x", 500, "boom")
            .reply("x", "ok");
        let req = ChatRequest::new(vec![Message::user("x")]);
        assert!(p.chat(&req).await.is_err());
        assert_eq!(p.chat(&req).await.unwrap().content, "ok");
        assert_eq!(p.call_count(), 2);
    }

    #[tokio::test]
    async fn unmatched_requests_get_placeholder() {
        let p = ScriptedProvider::new("gpt-4o-mini");
        let resp = p.chat(&ChatRequest::new(vec![Message::user("abcd")])).await.unwrap();
        assert!(resp.content.starts_with("Placeholder content"));
        assert_eq!(resp.model, "gpt-4o-mini");
    }
}
