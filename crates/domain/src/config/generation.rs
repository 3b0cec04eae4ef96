use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Bounded-concurrency batches of regular sections.
    #[default]
    Batched,
    /// One section at a time, in order.
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub mode: GenerationMode,
    /// Batch size for "mini" models.
    #[serde(default = "d_5")]
    pub fast_model_concurrency: usize,
    #[serde(default = "d_3")]
    pub default_concurrency: usize,
    #[serde(default = "d_section_temperature")]
    pub section_temperature: f32,
    #[serde(default = "d_4000")]
    pub section_max_tokens: u32,
    #[serde(default = "d_review_temperature")]
    pub review_temperature: f32,
    #[serde(default = "d_8000")]
    pub review_max_tokens: u32,
    /// Characters of each finished section shown to overview sections.
    #[serde(default = "d_1000")]
    pub overview_preview_chars: usize,
    #[serde(default = "d_true")]
    pub run_review: bool,
    /// Replaces the built-in section system prompt preamble.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            mode: GenerationMode::default(),
            fast_model_concurrency: d_5(),
            default_concurrency: d_3(),
            section_temperature: d_section_temperature(),
            section_max_tokens: d_4000(),
            review_temperature: d_review_temperature(),
            review_max_tokens: d_8000(),
            overview_preview_chars: d_1000(),
            run_review: true,
            system_prompt: None,
        }
    }
}

impl GenerationConfig {
    /// Concurrent calls per batch for `model`. Sequential mode is always 1.
    pub fn concurrency_for(&self, model: &str) -> usize {
        let n = match self.mode {
            GenerationMode::Sequential => 1,
            GenerationMode::Batched if model.contains("mini") => self.fast_model_concurrency,
            GenerationMode::Batched => self.default_concurrency,
        };
        n.max(1)
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_5() -> usize {
    5
}
fn d_3() -> usize {
    3
}
fn d_section_temperature() -> f32 {
    0.7
}
fn d_review_temperature() -> f32 {
    0.5
}
fn d_4000() -> u32 {
    4_000
}
fn d_8000() -> u32 {
    8_000
}
fn d_1000() -> usize {
    1_000
}
fn d_true() -> bool {
    true
}
