//! A single budget-gated completion call.

use rw_contextpack::TokenEstimator;
use rw_domain::error::Result;
use rw_domain::message::joined_text;
use rw_providers::{ChatRequest, LlmProvider};

use super::budget::SessionBudgetGuard;

/// Result of one completion, with its billed tokens and cost.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub tokens: u64,
    pub cost_usd: f64,
}

/// Check the budget, dispatch, then bill the call.
///
/// When the provider does not report usage, tokens are estimated from the
/// prompt and response text.
pub async fn complete(
    provider: &dyn LlmProvider,
    budget: &SessionBudgetGuard,
    estimator: &TokenEstimator,
    req: &ChatRequest,
) -> Result<Completion> {
    budget.check()?;

    let resp = provider.chat(req).await?;
    let model = req
        .model
        .as_deref()
        .unwrap_or_else(|| provider.default_model());
    let tokens = resp.usage.billable_tokens(|| {
        estimator.estimate_tokens(&joined_text(&req.messages))
            + estimator.estimate_tokens(&resp.content)
    });
    let cost_usd = budget.record_usage(tokens, model);

    tracing::debug!(model, tokens, cost_usd, "completion billed");

    Ok(Completion {
        content: resp.content,
        tokens,
        cost_usd,
    })
}
