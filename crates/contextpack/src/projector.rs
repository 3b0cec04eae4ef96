use rw_domain::config::TokenBudgetConfig;
use rw_domain::report::{partition_sections, Document, Section};

use crate::report::{CostBreakdown, SectionProjection};
use crate::tokens::TokenEstimator;

/// Projects token use for a whole report run without calling anything.
///
/// Regular sections are projected first, then overview sections (each
/// seeing a share of everything projected before it), then the review.
#[derive(Debug, Clone)]
pub struct GenerationCostProjector {
    estimator: TokenEstimator,
    budget: TokenBudgetConfig,
    include_review: bool,
}

impl Default for GenerationCostProjector {
    fn default() -> Self {
        Self::from_config(&TokenBudgetConfig::default())
    }
}

impl GenerationCostProjector {
    pub fn from_config(budget: &TokenBudgetConfig) -> Self {
        Self {
            estimator: TokenEstimator::from_config(budget),
            budget: budget.clone(),
            include_review: true,
        }
    }

    pub fn with_review(mut self, include: bool) -> Self {
        self.include_review = include;
        self
    }

    pub fn project(&self, sections: &[Section], global_documents: &[Document]) -> CostBreakdown {
        let b = &self.budget;
        let global_tokens = self.document_tokens(global_documents).min(b.max_global_tokens);

        let (regular, overview) = partition_sections(sections);
        let mut out = CostBreakdown {
            global_tokens,
            ..CostBreakdown::default()
        };
        let mut running: u64 = 0;

        for section in regular {
            let document_tokens = self.document_tokens(&section.documents);
            let instruction_tokens = self.estimator.estimate_tokens(&section.instructions);
            let manual_tokens = section
                .manual_text()
                .map_or(0, |t| self.estimator.estimate_tokens(t));
            let context = (global_tokens + document_tokens + instruction_tokens + manual_tokens)
                .min(b.max_section_context_tokens);
            let tokens = context + b.call_overhead_tokens;

            running += tokens;
            out.regular_tokens += tokens;
            out.sections.push(SectionProjection {
                section_id: section.id().clone(),
                name: section.name.clone(),
                overview: false,
                document_tokens,
                instruction_tokens,
                manual_tokens,
                context_tokens: global_tokens,
                overhead_tokens: b.call_overhead_tokens,
                tokens,
            });
        }

        for section in overview {
            let context_tokens = b.context_share(running).min(b.max_overview_context_tokens);
            let document_tokens = self.document_tokens(&section.documents);
            let instruction_tokens = self.estimator.estimate_tokens(&section.instructions);
            let tokens = context_tokens + document_tokens + instruction_tokens + b.call_overhead_tokens;

            running += tokens;
            out.overview_tokens += tokens;
            out.sections.push(SectionProjection {
                section_id: section.id().clone(),
                name: section.name.clone(),
                overview: true,
                document_tokens,
                instruction_tokens,
                manual_tokens: 0,
                context_tokens,
                overhead_tokens: b.call_overhead_tokens,
                tokens,
            });
        }

        if self.include_review {
            out.review_tokens = b.context_share(running).min(b.max_review_tokens);
        }
        out.total_tokens = running + out.review_tokens;
        out
    }

    fn document_tokens(&self, docs: &[Document]) -> u64 {
        docs.iter().map(|d| self.estimator.estimate_document(d)).sum()
    }
}
