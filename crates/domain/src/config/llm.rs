use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for the OpenAI-compatible chat-completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            model: d_model(),
            timeout_ms: d_timeout_ms(),
            auth: AuthConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Whether requests go to the public OpenAI endpoint.
    pub fn is_openai(&self) -> bool {
        self.base_url.trim_end_matches('/') == OPENAI_BASE_URL
    }
}

/// Where the API key comes from.
///
/// Resolution order: `key`, then keychain (`service` + `account`), then `env`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header name. Defaults to `Authorization`.
    #[serde(default)]
    pub header: Option<String>,
    /// Header value prefix. Defaults to `Bearer `.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Env var containing the key.
    #[serde(default = "d_env")]
    pub env: Option<String>,
    /// Direct key (prefer env or keychain).
    #[serde(default)]
    pub key: Option<String>,
    /// Keychain service name (e.g., "reportwright").
    #[serde(default)]
    pub service: Option<String>,
    /// Keychain account name (e.g., "openai-api-key").
    #[serde(default)]
    pub account: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header: None,
            prefix: None,
            env: d_env(),
            key: None,
            service: None,
            account: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_base_url() -> String {
    OPENAI_BASE_URL.into()
}
fn d_model() -> String {
    "gpt-4o".into()
}
fn d_timeout_ms() -> u64 {
    120_000
}
fn d_env() -> Option<String> {
    Some("OPENAI_API_KEY".into())
}
