//! Session spend ceiling.
//!
//! [`SessionBudgetGuard`] is an in-memory, lock-protected running total of
//! what the current session has spent on completions. Every outbound
//! generation call checks it right before dispatch. The check is not a
//! reservation: calls issued concurrently may each pass and push the total
//! past the ceiling by at most one in-flight call each.

use parking_lot::Mutex;
use serde::Serialize;

use rw_contextpack::CostEstimator;
use rw_domain::config::Config;
use rw_domain::error::{Error, Result};
use rw_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Ledger {
    ceiling_usd: f64,
    spent_usd: f64,
    tokens: u64,
}

/// Snapshot of the guard for display.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BudgetStatus {
    pub ceiling_usd: f64,
    pub spent_usd: f64,
    pub tokens: u64,
}

impl BudgetStatus {
    pub fn remaining_usd(&self) -> f64 {
        (self.ceiling_usd - self.spent_usd).max(0.0)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SessionBudgetGuard
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tracks session spend against a ceiling.
///
/// Created at session start and dropped with it; spend is never persisted.
pub struct SessionBudgetGuard {
    estimator: CostEstimator,
    ledger: Mutex<Ledger>,
}

impl SessionBudgetGuard {
    pub fn new(estimator: CostEstimator, ceiling_usd: f64) -> Self {
        Self {
            estimator,
            ledger: Mutex::new(Ledger {
                ceiling_usd,
                spent_usd: 0.0,
                tokens: 0,
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CostEstimator::new(config.pricing.clone()),
            config.session.max_budget_usd,
        )
    }

    pub fn estimator(&self) -> &CostEstimator {
        &self.estimator
    }

    /// `true` while spend is strictly below the ceiling.
    pub fn can_proceed(&self) -> bool {
        let ledger = self.ledger.lock();
        ledger.spent_usd < ledger.ceiling_usd
    }

    /// Gate for a single outbound call.
    pub fn check(&self) -> Result<()> {
        let (limit_usd, used_usd) = {
            let ledger = self.ledger.lock();
            if ledger.spent_usd < ledger.ceiling_usd {
                return Ok(());
            }
            (ledger.ceiling_usd, ledger.spent_usd)
        };
        tracing::warn!(limit_usd, used_usd, "session budget reached, call rejected");
        TraceEvent::BudgetRejected {
            limit_usd,
            used_usd,
        }
        .emit();
        Err(Error::BudgetExceeded {
            limit_usd,
            used_usd,
        })
    }

    /// Price `tokens` for `model` and add it to the running total.
    /// Returns the unrounded cost that was added.
    pub fn record_usage(&self, tokens: u64, model: &str) -> f64 {
        let cost = self.estimator.raw_cost(tokens, model);
        let mut ledger = self.ledger.lock();
        ledger.spent_usd += cost;
        ledger.tokens += tokens;
        cost
    }

    pub fn record_cost(&self, cost_usd: f64) {
        self.ledger.lock().spent_usd += cost_usd.max(0.0);
    }

    pub fn set_ceiling(&self, ceiling_usd: f64) {
        self.ledger.lock().ceiling_usd = ceiling_usd;
    }

    /// Forget all spend. The ceiling is kept.
    pub fn reset(&self) {
        let mut ledger = self.ledger.lock();
        ledger.spent_usd = 0.0;
        ledger.tokens = 0;
    }

    pub fn spent(&self) -> f64 {
        self.ledger.lock().spent_usd
    }

    pub fn ceiling(&self) -> f64 {
        self.ledger.lock().ceiling_usd
    }

    pub fn status(&self) -> BudgetStatus {
        let ledger = self.ledger.lock();
        BudgetStatus {
            ceiling_usd: ledger.ceiling_usd,
            spent_usd: ledger.spent_usd,
            tokens: ledger.tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rw_domain::config::PriceTable;
    use rw_domain::error::ErrorKind;

    fn guard(ceiling: f64) -> SessionBudgetGuard {
        SessionBudgetGuard::new(CostEstimator::new(PriceTable::default()), ceiling)
    }

    #[test]
    fn fresh_guard_can_proceed() {
        let g = guard(5.0);
        assert!(g.can_proceed());
        assert!(g.check().is_ok());
        assert_eq!(g.spent(), 0.0);
    }

    #[test]
    fn crossing_the_ceiling_blocks() {
        let g = guard(5.0);
        g.record_cost(4.99);
        assert!(g.can_proceed());

        g.record_cost(0.02);
        assert!(!g.can_proceed());

        let err = g.check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Budget);
        assert!(matches!(err, Error::BudgetExceeded { limit_usd, .. } if limit_usd == 5.0));
    }

    #[test]
    fn recorded_usage_is_priced_by_model() {
        let g = guard(5.0);
        g.record_cost(4.99);

        // 2.5k tokens: 2.5 * 0.005 input + 2.5 * 0.3 * 0.015 output.
        let added = g.record_usage(2_500, "gpt-4o");
        assert!((added - 0.02375).abs() < 1e-9);
        assert!(!g.can_proceed());
    }

    #[test]
    fn exactly_at_ceiling_is_blocked() {
        let g = guard(1.0);
        g.record_cost(1.0);
        assert!(!g.can_proceed());
    }

    #[test]
    fn stays_blocked_until_raised_or_reset() {
        let g = guard(1.0);
        g.record_cost(1.5);
        assert!(!g.can_proceed());
        assert!(!g.can_proceed());

        g.set_ceiling(2.0);
        assert!(g.can_proceed());

        g.set_ceiling(1.0);
        assert!(!g.can_proceed());
        g.reset();
        assert!(g.can_proceed());
        assert_eq!(g.ceiling(), 1.0);
    }

    #[test]
    fn zero_ceiling_blocks_everything() {
        let g = guard(0.0);
        assert!(!g.can_proceed());
    }

    #[test]
    fn status_tracks_tokens() {
        let g = guard(5.0);
        g.record_usage(1_000, "gpt-4o");
        g.record_usage(1_000, "gpt-4o");
        let status = g.status();
        assert_eq!(status.tokens, 2_000);
        assert!((status.spent_usd - 0.019).abs() < 1e-9);
        assert!((status.remaining_usd() - 4.981).abs() < 1e-9);
    }

    #[test]
    fn negative_cost_is_ignored() {
        let g = guard(1.0);
        g.record_cost(-3.0);
        assert_eq!(g.spent(), 0.0);
    }
}
