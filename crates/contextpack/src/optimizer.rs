use rw_domain::config::TokenBudgetConfig;
use rw_domain::report::Document;

use crate::report::OptimizedContext;
use crate::tokens::TokenEstimator;
use crate::truncation::{summarize_documents, truncate_document};

/// Packs documents into a per-call token budget.
///
/// Deterministic single pass over the input order: documents are
/// included whole until one overflows, which is either truncated to the
/// remaining budget (minus a margin) or dropped. Nothing after it is tried.
#[derive(Debug, Clone)]
pub struct ContextOptimizer {
    estimator: TokenEstimator,
    /// Remaining budget must exceed this for a partial include.
    partial_min_remaining: u64,
    /// Headroom kept free when truncating the partial document.
    partial_margin: u64,
}

impl Default for ContextOptimizer {
    fn default() -> Self {
        Self::from_config(&TokenBudgetConfig::default())
    }
}

impl ContextOptimizer {
    pub fn new(estimator: TokenEstimator, partial_min_remaining: u64, partial_margin: u64) -> Self {
        Self {
            estimator,
            partial_min_remaining,
            partial_margin,
        }
    }

    pub fn from_config(cfg: &TokenBudgetConfig) -> Self {
        Self::new(
            TokenEstimator::from_config(cfg),
            cfg.partial_min_remaining_tokens,
            cfg.partial_margin_tokens,
        )
    }

    pub fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }

    pub fn optimize(&self, documents: &[Document], instruction: &str, max_tokens: u64) -> OptimizedContext {
        let est = &self.estimator;
        let candidates = summarize_documents(est, documents);

        let mut total = est.estimate_tokens(instruction);
        let mut included = Vec::with_capacity(candidates.len());
        let mut partial = 0;

        if total <= max_tokens {
            for mut doc in candidates {
                let tokens = est.estimate_tokens(&doc.content);
                if total + tokens <= max_tokens {
                    total += tokens;
                    included.push(doc);
                    continue;
                }

                let remaining = max_tokens - total;
                if remaining > self.partial_min_remaining {
                    let target = remaining.saturating_sub(self.partial_margin);
                    let content = truncate_document(est, &doc, target);
                    total += est.estimate_tokens(&content);
                    doc.content = content;
                    doc.truncated = true;
                    doc.partially_included = true;
                    included.push(doc);
                    partial = 1;
                }
                break;
            }
        }

        let ctx = OptimizedContext {
            documents_included: included.len(),
            documents_partial: partial,
            documents_skipped: documents.len() - included.len(),
            documents: included,
            total_tokens: total,
        };

        tracing::debug!(
            max_tokens,
            total_tokens = ctx.total_tokens,
            included = ctx.documents_included,
            partial = ctx.documents_partial,
            skipped = ctx.documents_skipped,
            "context optimized"
        );

        ctx
    }
}
