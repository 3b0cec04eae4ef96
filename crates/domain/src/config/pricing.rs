use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pricing and rate limits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-model pricing (dollars per 1K tokens) and published rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
    /// Published tokens-per-minute limit, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_per_minute: Option<u64>,
}

impl ModelPricing {
    pub const fn new(input_per_1k: f64, output_per_1k: f64, tokens_per_minute: u64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
            tokens_per_minute: Some(tokens_per_minute),
        }
    }
}

/// Injectable price table. Unknown models resolve to the default model's entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    #[serde(default = "d_default_model")]
    pub default_model: String,
    /// Output tokens assumed per input token when projecting cost.
    #[serde(default = "d_output_ratio")]
    pub output_ratio: f64,
    /// Rate limit used when a model has none configured.
    #[serde(default = "d_fallback_tpm")]
    pub fallback_tokens_per_minute: u64,
    #[serde(default = "d_models")]
    pub models: BTreeMap<String, ModelPricing>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            default_model: d_default_model(),
            output_ratio: d_output_ratio(),
            fallback_tokens_per_minute: d_fallback_tpm(),
            models: d_models(),
        }
    }
}

/// Used when neither the model nor the default model is in the table.
const LAST_RESORT: ModelPricing = ModelPricing::new(0.005, 0.015, 30_000);

impl PriceTable {
    /// Pricing for `model`, falling back to the default model's entry.
    pub fn pricing_for(&self, model: &str) -> ModelPricing {
        self.models
            .get(model)
            .or_else(|| self.models.get(&self.default_model))
            .copied()
            .unwrap_or(LAST_RESORT)
    }

    /// Whether `model` has its own entry.
    pub fn is_known(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    /// Tokens-per-minute limit for `model`. Unknown models use the fallback.
    pub fn tokens_per_minute(&self, model: &str) -> u64 {
        self.models
            .get(model)
            .and_then(|p| p.tokens_per_minute)
            .unwrap_or(self.fallback_tokens_per_minute)
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_default_model() -> String {
    "gpt-4o".into()
}
fn d_output_ratio() -> f64 {
    0.3
}
fn d_fallback_tpm() -> u64 {
    30_000
}
fn d_models() -> BTreeMap<String, ModelPricing> {
    [
        ("gpt-4o", ModelPricing::new(0.005, 0.015, 30_000)),
        ("gpt-4o-mini", ModelPricing::new(0.00015, 0.0006, 200_000)),
        ("gpt-4-turbo", ModelPricing::new(0.01, 0.03, 30_000)),
        ("gpt-4", ModelPricing::new(0.03, 0.06, 10_000)),
        ("o1-preview", ModelPricing::new(0.015, 0.06, 20_000)),
        ("o1-mini", ModelPricing::new(0.003, 0.012, 100_000)),
    ]
    .into_iter()
    .map(|(name, p)| (name.to_owned(), p))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_uses_default_entry() {
        let table = PriceTable::default();
        assert_eq!(table.pricing_for("made-up"), table.pricing_for("gpt-4o"));
        assert!(!table.is_known("made-up"));
    }

    #[test]
    fn rate_limits_fall_back() {
        let table = PriceTable::default();
        assert_eq!(table.tokens_per_minute("gpt-4o-mini"), 200_000);
        assert_eq!(table.tokens_per_minute("gpt-4"), 10_000);
        assert_eq!(table.tokens_per_minute("mystery"), 30_000);
    }

    #[test]
    fn empty_table_uses_last_resort() {
        let table = PriceTable {
            models: BTreeMap::new(),
            ..PriceTable::default()
        };
        let p = table.pricing_for("gpt-4o");
        assert!((p.input_per_1k - 0.005).abs() < 1e-12);
    }

    #[test]
    fn custom_table_deserializes() {
        let toml_src = r#"
            default_model = "cheap"
            [models.cheap]
            input_per_1k = 0.01
            output_per_1k = 0.0
        "#;
        let table: PriceTable = toml::from_str(toml_src).unwrap();
        assert_eq!(table.models.len(), 1);
        assert_eq!(table.pricing_for("anything").input_per_1k, 0.01);
        assert_eq!(table.tokens_per_minute("cheap"), 30_000);
        assert!((table.output_ratio - 0.3).abs() < 1e-12);
    }
}
