use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Token budgets
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Limits and heuristics used for token estimation and context fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBudgetConfig {
    /// Characters per estimated token.
    #[serde(default = "d_chars_per_token")]
    pub chars_per_token: u32,
    /// Per-document cap applied during summarization.
    #[serde(default = "d_3000")]
    pub max_document_tokens: u64,
    /// Default ceiling for one section call's instruction + documents.
    #[serde(default = "d_8000")]
    pub max_section_context_tokens: u64,
    /// Ceiling for the review pass.
    #[serde(default = "d_15000")]
    pub max_review_tokens: u64,
    /// Cap on the global document contribution to a projection.
    #[serde(default = "d_10000")]
    pub max_global_tokens: u64,
    /// Cap on the other-sections context fed to an overview section.
    #[serde(default = "d_5000")]
    pub max_overview_context_tokens: u64,
    /// Fixed system-prompt and formatting overhead added per call.
    #[serde(default = "d_500")]
    pub call_overhead_tokens: u64,
    /// Minimum remaining budget before a document is partially included.
    #[serde(default = "d_500")]
    pub partial_min_remaining_tokens: u64,
    /// Headroom kept free when partially including a document.
    #[serde(default = "d_100")]
    pub partial_margin_tokens: u64,
    /// Share (percent) of total section tokens assumed for overview/review context.
    #[serde(default = "d_30")]
    pub context_share_percent: u64,
}

impl Default for TokenBudgetConfig {
    fn default() -> Self {
        Self {
            chars_per_token: d_chars_per_token(),
            max_document_tokens: d_3000(),
            max_section_context_tokens: d_8000(),
            max_review_tokens: d_15000(),
            max_global_tokens: d_10000(),
            max_overview_context_tokens: d_5000(),
            call_overhead_tokens: d_500(),
            partial_min_remaining_tokens: d_500(),
            partial_margin_tokens: d_100(),
            context_share_percent: d_30(),
        }
    }
}

impl TokenBudgetConfig {
    /// Apply the context share to `total`, rounding down.
    pub fn context_share(&self, total: u64) -> u64 {
        total.saturating_mul(self.context_share_percent) / 100
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_chars_per_token() -> u32 {
    4
}
fn d_3000() -> u64 {
    3_000
}
fn d_8000() -> u64 {
    8_000
}
fn d_15000() -> u64 {
    15_000
}
fn d_10000() -> u64 {
    10_000
}
fn d_5000() -> u64 {
    5_000
}
fn d_500() -> u64 {
    500
}
fn d_100() -> u64 {
    100
}
fn d_30() -> u64 {
    30
}
