use rw_domain::report::{Document, SectionId};
use serde::{Deserialize, Serialize};

/// Documents selected for one generation call, with accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedContext {
    /// Included documents in input order. At most the last one is partial.
    pub documents: Vec<Document>,
    /// Instruction tokens plus the tokens of every included document.
    pub total_tokens: u64,
    /// Documents sent at all, whole or partial.
    pub documents_included: usize,
    pub documents_partial: usize,
    /// Documents dropped entirely.
    pub documents_skipped: usize,
}

impl OptimizedContext {
    pub fn has_partial(&self) -> bool {
        self.documents_partial > 0
    }
}

/// Projected tokens for one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionProjection {
    pub section_id: SectionId,
    pub name: String,
    pub overview: bool,
    pub document_tokens: u64,
    pub instruction_tokens: u64,
    pub manual_tokens: u64,
    /// Global documents for regular sections, other-section context for
    /// overview sections.
    pub context_tokens: u64,
    pub overhead_tokens: u64,
    /// Everything above, after the per-section cap.
    pub tokens: u64,
}

/// Whole-report token projection. Derived only, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Regular sections in order, then overview sections in order.
    pub sections: Vec<SectionProjection>,
    pub global_tokens: u64,
    pub regular_tokens: u64,
    pub overview_tokens: u64,
    pub review_tokens: u64,
    pub total_tokens: u64,
}
