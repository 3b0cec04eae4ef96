//! OpenAI-compatible adapter.
//!
//! Works with OpenAI and any endpoint that follows the OpenAI chat
//! completions contract (Azure front-ends, Ollama, vLLM, LM Studio).

use std::time::{Duration, Instant};

use rw_domain::config::LlmConfig;
use rw_domain::error::{Error, Result};
use rw_domain::message::Message;
use rw_domain::trace::TraceEvent;
use rw_domain::usage::{Usage, UsageReport};
use serde_json::Value;

use crate::traits::{is_reasoning_model, ChatRequest, ChatResponse, LlmProvider};
use crate::util::{from_reqwest, resolve_api_key, validate_openai_key};

const PROVIDER_ID: &str = "openai_compat";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OpenAiCompatProvider {
    base_url: String,
    api_key: String,
    auth_header: String,
    auth_prefix: String,
    default_model: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider from config, resolving and validating the key.
    ///
    /// The `sk-` prefix check only applies to the public OpenAI endpoint.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        if cfg.is_openai() {
            validate_openai_key(&api_key)?;
        }
        Self::with_key(cfg, api_key)
    }

    /// Create a provider with an already-resolved key.
    pub fn with_key(cfg: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            auth_header: cfg.auth.header.clone().unwrap_or_else(|| "Authorization".into()),
            auth_prefix: cfg.auth.prefix.clone().unwrap_or_else(|| "Bearer ".into()),
            default_model: cfg.model.clone(),
            client,
        })
    }

    // ── Internal: authenticated request builders ───────────────────

    fn auth_value(&self) -> String {
        format!("{}{}", self.auth_prefix, self.api_key)
    }

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header(&self.auth_header, self.auth_value())
            .header("Content-Type", "application/json")
    }

    fn authed_get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url).header(&self.auth_header, self.auth_value())
    }

    fn effective_model(&self, req: &ChatRequest) -> String {
        req.model
            .clone()
            .unwrap_or_else(|| self.default_model.clone())
    }

    fn build_chat_body(&self, req: &ChatRequest) -> Value {
        let model = self.effective_model(req);
        let messages: Vec<Value> = req.messages.iter().map(msg_to_openai).collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });
        if let Some(temp) = req.temperature {
            if !is_reasoning_model(&model) {
                body["temperature"] = serde_json::json!(temp);
            }
        }
        if let Some(max) = req.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }
        body
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn msg_to_openai(msg: &Message) -> Value {
    serde_json::json!({
        "role": msg.role.as_str(),
        "content": msg.content,
    })
}

fn parse_chat_response(body: &Value) -> Result<ChatResponse> {
    let content = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or(Error::EmptyResponse)?
        .to_string();

    let model = body
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    let usage = UsageReport::from_option(body.get("usage").and_then(parse_openai_usage));

    Ok(ChatResponse {
        content,
        usage,
        model,
    })
}

fn parse_openai_usage(v: &Value) -> Option<Usage> {
    let prompt_tokens = v.get("prompt_tokens")?.as_u64()?;
    let completion_tokens = v.get("completion_tokens")?.as_u64()?;
    let total_tokens = v
        .get("total_tokens")
        .and_then(|t| t.as_u64())
        .unwrap_or(prompt_tokens + completion_tokens);
    Some(Usage {
        prompt_tokens,
        completion_tokens,
        total_tokens,
    })
}

/// Error for a non-success status: the provider's `error.message` when
/// present, otherwise a generic status message.
fn provider_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("API request failed with status {status}"));
    Error::Provider {
        provider: PROVIDER_ID.into(),
        status: Some(status),
        message,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_chat_body(req);
        let model = self.effective_model(req);
        let started = Instant::now();

        tracing::debug!(provider = PROVIDER_ID, url = %url, model = %model, "chat request");

        let resp = self
            .authed_post(&url)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(provider_error(status.as_u16(), &resp_text));
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        let parsed = parse_chat_response(&resp_json)?;

        let (prompt_tokens, completion_tokens) = match parsed.usage {
            UsageReport::Reported(u) => (Some(u.prompt_tokens), Some(u.completion_tokens)),
            UsageReport::Unreported => (None, None),
        };
        TraceEvent::LlmRequest {
            provider: PROVIDER_ID.into(),
            model,
            purpose: "chat".into(),
            duration_ms: started.elapsed().as_millis() as u64,
            prompt_tokens,
            completion_tokens,
        }
        .emit();

        Ok(parsed)
    }

    async fn test_connection(&self) -> Result<()> {
        let url = format!("{}/models", self.base_url);
        let resp = self.authed_get(&url).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.map_err(from_reqwest)?;
        Err(provider_error(status.as_u16(), &body))
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rw_domain::error::ErrorKind;

    fn provider() -> OpenAiCompatProvider {
        OpenAiCompatProvider::with_key(&LlmConfig::default(), "sk-test").unwrap()
    }

    #[test]
    fn body_includes_temperature_for_chat_models() {
        let req = ChatRequest::new(vec![Message::system("s"), Message::user("u")])
            .with_temperature(0.7)
            .with_max_tokens(4000);
        let body = provider().build_chat_body(&req);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "u");
        assert!(body.get("temperature").is_some());
        assert_eq!(body["max_tokens"], 4000);
    }

    #[test]
    fn body_omits_temperature_for_reasoning_models() {
        let req = ChatRequest::new(vec![Message::user("u")])
            .with_model("o1-preview")
            .with_temperature(0.7);
        let body = provider().build_chat_body(&req);
        assert_eq!(body["model"], "o1-preview");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn parses_response_with_usage() {
        let body = serde_json::json!({
            "model": "gpt-4o-2024",
            "choices": [{"message": {"role": "assistant", "content": "Hello"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        });
        let resp = parse_chat_response(&body).unwrap();
        assert_eq!(resp.content, "Hello");
        assert_eq!(resp.model, "gpt-4o-2024");
        assert_eq!(resp.usage.billable_tokens(|| 0), 12);
    }

    #[test]
    fn missing_usage_is_unreported() {
        let body = serde_json::json!({
            "choices": [{"message": {"content": "Hello"}}]
        });
        let resp = parse_chat_response(&body).unwrap();
        assert_eq!(resp.usage, UsageReport::Unreported);
    }

    #[test]
    fn empty_choices_is_empty_response() {
        let body = serde_json::json!({ "choices": [] });
        assert!(matches!(parse_chat_response(&body), Err(Error::EmptyResponse)));
    }

    #[test]
    fn provider_error_prefers_body_message() {
        let err = provider_error(400, r#"{"error":{"message":"bad model"}}"#);
        assert_eq!(err.to_string(), "provider openai_compat: bad model");
        assert_eq!(err.kind(), ErrorKind::Rejected);

        let err = provider_error(503, "upstream down");
        assert_eq!(
            err.to_string(),
            "provider openai_compat: API request failed with status 503"
        );
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[test]
    fn from_config_rejects_non_sk_key_for_openai() {
        let mut cfg = LlmConfig::default();
        cfg.auth.key = Some("not-a-key".into());
        cfg.auth.env = None;
        assert!(matches!(
            OpenAiCompatProvider::from_config(&cfg),
            Err(Error::InvalidCredential(_))
        ));
    }

    #[test]
    fn from_config_accepts_any_key_for_other_endpoints() {
        let mut cfg = LlmConfig::default();
        cfg.base_url = "http://localhost:11434/v1".into();
        cfg.auth.key = Some("local".into());
        cfg.auth.env = None;
        assert!(OpenAiCompatProvider::from_config(&cfg).is_ok());
    }
}
