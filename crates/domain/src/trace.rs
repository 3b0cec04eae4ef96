use serde::Serialize;

/// Structured trace events emitted across all reportwright crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ContextOptimized {
        section: String,
        total_tokens: u64,
        documents_included: usize,
        documents_partial: usize,
        documents_skipped: usize,
    },
    DocumentIngested {
        name: String,
        kind: String,
        size: u64,
        content_chars: usize,
    },
    LlmRequest {
        provider: String,
        model: String,
        purpose: String,
        duration_ms: u64,
        prompt_tokens: Option<u64>,
        completion_tokens: Option<u64>,
    },
    BudgetRejected {
        limit_usd: f64,
        used_usd: f64,
    },
    SectionFinished {
        section_id: String,
        section: String,
        status: String,
        tokens: u64,
        cost_usd: f64,
        duration_ms: u64,
    },
    ReviewFinished {
        sections: usize,
        tokens: u64,
        cost_usd: f64,
        succeeded: bool,
    },
    RunFinished {
        run_id: String,
        completed: usize,
        failed: usize,
        cancelled: bool,
        spent_usd: f64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "rw_event");
    }
}
