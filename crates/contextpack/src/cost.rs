use rw_domain::config::PriceTable;
use serde::{Deserialize, Serialize};

/// Monetary estimate for a token count, rounded to cents for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

/// Projected tokens compared against a model's tokens-per-minute limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub tokens: u64,
    pub limit: u64,
    pub exceeded: bool,
    /// `tokens / limit` as a percentage, one decimal place.
    pub percentage: f64,
}

/// Maps token counts to dollars through an injected [`PriceTable`].
///
/// Output volume is assumed to be a fixed fraction of input volume.
#[derive(Debug, Clone, Default)]
pub struct CostEstimator {
    table: PriceTable,
}

impl CostEstimator {
    pub fn new(table: PriceTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PriceTable {
        &self.table
    }

    /// Unrounded cost in dollars. Used for budget accounting.
    pub fn raw_cost(&self, tokens: u64, model: &str) -> f64 {
        let (input, output) = self.split(tokens, model);
        input + output
    }

    pub fn estimate_cost(&self, tokens: u64, model: &str) -> CostEstimate {
        let (input, output) = self.split(tokens, model);
        CostEstimate {
            input_cost: round_cents(input),
            output_cost: round_cents(output),
            total_cost: round_cents(input + output),
        }
    }

    pub fn check_rate_limits(&self, tokens: u64, model: &str) -> RateLimitStatus {
        let limit = self.table.tokens_per_minute(model);
        let percentage = if limit == 0 {
            if tokens == 0 { 0.0 } else { f64::INFINITY }
        } else {
            (tokens as f64 / limit as f64 * 1_000.0).round() / 10.0
        };
        RateLimitStatus {
            tokens,
            limit,
            exceeded: tokens > limit,
            percentage,
        }
    }

    fn split(&self, tokens: u64, model: &str) -> (f64, f64) {
        let pricing = self.table.pricing_for(model);
        let k = tokens as f64 / 1_000.0;
        let input = k * pricing.input_per_1k;
        let output = k * self.table.output_ratio * pricing.output_per_1k;
        (input, output)
    }
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpt4o_cost_for_twenty_thousand_tokens() {
        let est = CostEstimator::default();
        // input 20 * 0.005 = 0.10, output 20 * 0.3 * 0.015 = 0.09
        let cost = est.estimate_cost(20_000, "gpt-4o");
        assert_eq!(cost.input_cost, 0.1);
        assert_eq!(cost.output_cost, 0.09);
        assert_eq!(cost.total_cost, 0.19);
        assert!((est.raw_cost(20_000, "gpt-4o") - 0.19).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_priced_as_default() {
        let est = CostEstimator::default();
        assert_eq!(
            est.raw_cost(5_000, "not-a-model"),
            est.raw_cost(5_000, "gpt-4o")
        );
    }

    #[test]
    fn zero_tokens_cost_nothing() {
        let cost = CostEstimator::default().estimate_cost(0, "gpt-4");
        assert_eq!(cost.total_cost, 0.0);
    }

    #[test]
    fn rate_limit_check() {
        let est = CostEstimator::default();
        let status = est.check_rate_limits(15_000, "gpt-4o");
        assert_eq!(status.limit, 30_000);
        assert!(!status.exceeded);
        assert_eq!(status.percentage, 50.0);

        let status = est.check_rate_limits(12_340, "gpt-4");
        assert!(status.exceeded);
        assert_eq!(status.percentage, 123.4);
    }
}
