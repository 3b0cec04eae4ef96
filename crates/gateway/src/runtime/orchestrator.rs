//! Report generation: regular sections in batches, then overview sections,
//! then an optional review stage that unifies everything.
//!
//! A section failure is recorded against that section and the run moves
//! on. Pause and cancel are honoured between sections; calls already in
//! flight always finish.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use rw_contextpack::injection::format_section_preview;
use rw_contextpack::truncation::summarize_documents;
use rw_contextpack::{ContextOptimizer, TokenEstimator};
use rw_domain::config::{Config, GenerationConfig, TokenBudgetConfig};
use rw_domain::error::{Error, ErrorKind, Result};
use rw_domain::report::{partition_sections, Document, Section, SectionId};
use rw_domain::trace::TraceEvent;
use rw_providers::{ChatRequest, LlmProvider};

use super::budget::SessionBudgetGuard;
use super::call::complete;
use super::control::RunControl;
use super::prompts::{review_messages, SectionPrompt};
use super::records::{GenerationRecord, RecordMap, RunState, SectionStatus};

pub const MANUAL_INPUT_DOCUMENT: &str = "Manual Input";
pub const OTHER_SECTIONS_DOCUMENT: &str = "Context from Other Sections";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Plan and outcome
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What to generate.
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    pub title: String,
    pub sections: Vec<Section>,
    pub global_documents: Vec<Document>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewOutcome {
    Skipped,
    Unified {
        content: String,
        tokens: u64,
        cost_usd: f64,
    },
    Failed {
        message: String,
        kind: ErrorKind,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub title: String,
    pub state: RunState,
    pub sections: Vec<GenerationRecord>,
    pub review: ReviewOutcome,
    pub spent_usd: f64,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.sections
            .iter()
            .filter(|r| r.status == SectionStatus::Complete)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.sections
            .iter()
            .filter(|r| r.status == SectionStatus::Error)
            .count()
    }

    /// The unified report, or the completed sections one after another
    /// when there is no unified text.
    pub fn final_text(&self) -> String {
        if let ReviewOutcome::Unified { content, .. } = &self.review {
            return content.clone();
        }
        self.sections
            .iter()
            .filter_map(|r| r.content.as_ref().map(|c| format!("## {}\n\n{}", r.name, c.trim())))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Plan as it was prepared for the last run. Retry and regenerate reuse it.
struct Prepared {
    title: String,
    sections: Vec<Section>,
    globals: Vec<Document>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GenerationOrchestrator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct GenerationOrchestrator {
    provider: Arc<dyn LlmProvider>,
    budget: Arc<SessionBudgetGuard>,
    control: RunControl,
    records: RecordMap,
    optimizer: ContextOptimizer,
    limits: TokenBudgetConfig,
    generation: GenerationConfig,
    model: String,
    state: RwLock<RunState>,
    prepared: RwLock<Option<Arc<Prepared>>>,
}

impl GenerationOrchestrator {
    pub fn new(config: &Config, provider: Arc<dyn LlmProvider>, budget: Arc<SessionBudgetGuard>) -> Self {
        Self {
            provider,
            budget,
            control: RunControl::new(),
            records: RecordMap::new(),
            optimizer: ContextOptimizer::from_config(&config.budget),
            limits: config.budget.clone(),
            generation: config.generation.clone(),
            model: config.llm.model.clone(),
            state: RwLock::new(RunState::Idle),
            prepared: RwLock::new(None),
        }
    }

    /// Handle for pausing or cancelling from elsewhere.
    pub fn control(&self) -> RunControl {
        self.control.clone()
    }

    pub fn state(&self) -> RunState {
        *self.state.read()
    }

    pub fn records(&self) -> Vec<GenerationRecord> {
        self.records.snapshot()
    }

    pub fn record(&self, id: &SectionId) -> Option<GenerationRecord> {
        self.records.get(id)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn pause(&self) {
        self.control.pause();
        let mut state = self.state.write();
        if *state == RunState::Generating {
            *state = RunState::Paused;
        }
    }

    pub fn resume(&self) {
        self.control.resume();
        let mut state = self.state.write();
        if *state == RunState::Paused {
            *state = RunState::Generating;
        }
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    fn estimator(&self) -> &TokenEstimator {
        self.optimizer.estimator()
    }

    fn set_state(&self, next: RunState) {
        *self.state.write() = next;
    }

    fn enter_active(&self) -> Result<()> {
        let mut state = self.state.write();
        if state.is_active() {
            return Err(Error::InvalidState("a generation run is already in progress".into()));
        }
        *state = RunState::Generating;
        Ok(())
    }

    // ── Full run ──────────────────────────────────────────────────────

    /// Generate every section of `plan` and, if enabled, unify them.
    ///
    /// Only plan validation fails the call. Section and review failures are
    /// reported in the returned [`RunReport`].
    pub async fn run(&self, plan: RunPlan) -> Result<RunReport> {
        validate_plan(&plan)?;
        self.enter_active()?;

        let run_id = Uuid::new_v4();
        let prepared = Arc::new(Prepared {
            title: plan.title,
            globals: summarize_documents(self.estimator(), &plan.global_documents),
            sections: plan.sections,
        });
        *self.prepared.write() = Some(prepared.clone());
        self.records.reset(&prepared.sections);

        tracing::info!(
            %run_id,
            sections = prepared.sections.len(),
            global_documents = prepared.globals.len(),
            model = %self.model,
            "generation run started"
        );

        let mut cancelled = self.generate_all(&prepared).await.is_err();
        let review = if cancelled {
            ReviewOutcome::Skipped
        } else {
            match self.review_stage(&prepared).await {
                Ok(review) => review,
                Err(_) => {
                    cancelled = true;
                    ReviewOutcome::Skipped
                }
            }
        };

        let completed = self.records.count(SectionStatus::Complete);
        let failed = self.records.count(SectionStatus::Error);
        let final_state = if cancelled {
            RunState::Cancelled
        } else if completed == 0 || matches!(review, ReviewOutcome::Failed { .. }) {
            RunState::Error
        } else {
            RunState::Complete
        };
        self.set_state(final_state);
        // Signals raised before this point belonged to this run.
        self.control.reset();

        let spent_usd = self.budget.spent();
        TraceEvent::RunFinished {
            run_id: run_id.to_string(),
            completed,
            failed,
            cancelled,
            spent_usd,
        }
        .emit();

        Ok(RunReport {
            run_id,
            title: prepared.title.clone(),
            state: final_state,
            sections: self.records.snapshot(),
            review,
            spent_usd,
        })
    }

    /// Regular sections in batches, then overview sections one by one.
    /// `Err` means the run was cancelled at a section boundary.
    async fn generate_all(&self, prepared: &Prepared) -> Result<()> {
        let (regular, overview) = partition_sections(&prepared.sections);
        let window = self.generation.concurrency_for(&self.model);

        for batch in regular.chunks(window) {
            self.boundary().await?;
            let tasks = batch
                .iter()
                .map(|section| self.generate_section(section, &prepared.globals));
            join_all(tasks).await;
        }

        // Every regular section is terminal here.
        for section in overview {
            self.boundary().await?;
            self.generate_section(section, &prepared.globals).await;
        }
        Ok(())
    }

    /// Pause/cancel checkpoint between sections.
    async fn boundary(&self) -> Result<()> {
        if self.control.is_paused() {
            self.set_state(RunState::Paused);
        }
        let res = self.control.wait_if_paused().await;
        if res.is_ok() {
            self.set_state(RunState::Generating);
        }
        res
    }

    // ── One section ───────────────────────────────────────────────────

    fn section_documents(&self, section: &Section, globals: &[Document]) -> (Vec<Document>, Vec<String>) {
        let mut docs: Vec<Document> = globals.to_vec();
        docs.extend(section.documents.iter().cloned());
        if let Some(text) = section.manual_text() {
            docs.push(Document::text(MANUAL_INPUT_DOCUMENT, text));
        }

        let mut previous = Vec::new();
        if section.overview {
            let done: Vec<(String, String)> = self
                .records
                .snapshot()
                .into_iter()
                .filter(|r| r.status == SectionStatus::Complete && r.section_id != *section.id())
                .filter_map(|r| r.content.map(|c| (r.name, c)))
                .collect();
            let summary = done
                .iter()
                .map(|(name, content)| {
                    format_section_preview(name, content, self.generation.overview_preview_chars)
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            if !summary.is_empty() {
                docs.push(Document::text(OTHER_SECTIONS_DOCUMENT, summary));
            }
            previous = done.into_iter().map(|(name, _)| name).collect();
        }
        (docs, previous)
    }

    async fn generate_section(&self, section: &Section, globals: &[Document]) {
        let id = section.id();
        if let Err(e) = self.records.begin(id) {
            tracing::warn!(section = %section.name, error = %e, "section not started");
            return;
        }
        let started = Instant::now();

        let (docs, previous) = self.section_documents(section, globals);
        let context = self.optimizer.optimize(
            &docs,
            &section.instructions,
            self.limits.max_section_context_tokens,
        );
        TraceEvent::ContextOptimized {
            section: section.name.clone(),
            total_tokens: context.total_tokens,
            documents_included: context.documents_included,
            documents_partial: context.documents_partial,
            documents_skipped: context.documents_skipped,
        }
        .emit();
        if context.documents_skipped > 0 {
            tracing::warn!(
                section = %section.name,
                skipped = context.documents_skipped,
                "documents left out of section context"
            );
        }

        let prompt = SectionPrompt {
            base_prompt: self.generation.system_prompt.as_deref(),
            name: &section.name,
            instructions: &section.instructions,
            documents: &context.documents,
            previous_sections: &previous,
        };
        let req = ChatRequest::new(prompt.messages())
            .with_model(self.model.clone())
            .with_temperature(self.generation.section_temperature)
            .with_max_tokens(self.generation.section_max_tokens);

        let outcome = complete(self.provider.as_ref(), &self.budget, self.estimator(), &req).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let (status, tokens, cost_usd) = match outcome {
            Ok(done) => {
                let (tokens, cost) = (done.tokens, done.cost_usd);
                self.records.complete(id, done.content, tokens, cost);
                (SectionStatus::Complete, tokens, cost)
            }
            Err(e) => {
                tracing::warn!(section = %section.name, kind = %e.kind(), error = %e, "section failed");
                self.records.fail(id, &e);
                (SectionStatus::Error, 0, 0.0)
            }
        };

        TraceEvent::SectionFinished {
            section_id: id.to_string(),
            section: section.name.clone(),
            status: status.as_str().into(),
            tokens,
            cost_usd,
            duration_ms,
        }
        .emit();
    }

    // ── Review ────────────────────────────────────────────────────────

    /// `Err` only when cancelled before the review call went out.
    async fn review_stage(&self, prepared: &Prepared) -> Result<ReviewOutcome> {
        if !self.generation.run_review {
            return Ok(ReviewOutcome::Skipped);
        }
        let sections = self.records.completed();
        if sections.is_empty() {
            return Ok(ReviewOutcome::Skipped);
        }
        self.boundary().await?;
        Ok(self.unify(&prepared.title, &sections).await)
    }

    /// Submit the completed sections to one unify call. All or nothing:
    /// a failure leaves no partial merge.
    async fn unify(&self, title: &str, sections: &[(String, String)]) -> ReviewOutcome {
        let max_chars = self.estimator().chars_for_tokens(self.limits.max_review_tokens);
        let sections: Vec<(String, String)> = sections
            .iter()
            .map(|(name, content)| (name.clone(), content.chars().take(max_chars).collect()))
            .collect();

        let req = ChatRequest::new(review_messages(title, &sections))
            .with_model(self.model.clone())
            .with_temperature(self.generation.review_temperature)
            .with_max_tokens(self.generation.review_max_tokens);

        let outcome = complete(self.provider.as_ref(), &self.budget, self.estimator(), &req).await;
        let (review, tokens, cost_usd, succeeded) = match outcome {
            Ok(done) => (
                ReviewOutcome::Unified {
                    content: done.content,
                    tokens: done.tokens,
                    cost_usd: done.cost_usd,
                },
                done.tokens,
                done.cost_usd,
                true,
            ),
            Err(e) => {
                tracing::warn!(kind = %e.kind(), error = %e, "review stage failed");
                (
                    ReviewOutcome::Failed {
                        message: e.to_string(),
                        kind: e.kind(),
                    },
                    0,
                    0.0,
                    false,
                )
            }
        };
        TraceEvent::ReviewFinished {
            sections: sections.len(),
            tokens,
            cost_usd,
            succeeded,
        }
        .emit();
        review
    }

    /// Re-run the review stage over whatever is complete now.
    pub async fn review(&self) -> Result<ReviewOutcome> {
        let prepared = self.prepared_plan()?;
        let sections = self.records.completed();
        if sections.is_empty() {
            return Err(Error::InvalidState("no completed sections to review".into()));
        }
        self.enter_active()?;
        let outcome = self.unify(&prepared.title, &sections).await;
        self.set_state(match outcome {
            ReviewOutcome::Failed { .. } => RunState::Error,
            _ => RunState::Complete,
        });
        self.control.reset();
        Ok(outcome)
    }

    // ── Single-section re-entry ───────────────────────────────────────

    /// Generate a failed section again. Other sections are untouched.
    pub async fn retry_section(&self, id: &SectionId) -> Result<GenerationRecord> {
        self.rerun_section(id, SectionStatus::Error).await
    }

    /// Replace the content of a completed section.
    pub async fn regenerate_section(&self, id: &SectionId) -> Result<GenerationRecord> {
        self.rerun_section(id, SectionStatus::Complete).await
    }

    async fn rerun_section(&self, id: &SectionId, expected: SectionStatus) -> Result<GenerationRecord> {
        let prepared = self.prepared_plan()?;
        let section = prepared
            .sections
            .iter()
            .find(|s| s.id() == id)
            .ok_or_else(|| Error::NotFound(format!("section {id}")))?;
        let current = self
            .records
            .status(id)
            .ok_or_else(|| Error::NotFound(format!("section {id}")))?;
        if current != expected {
            return Err(Error::InvalidState(format!(
                "section \"{}\" is {}, expected {}",
                section.name,
                current.as_str(),
                expected.as_str()
            )));
        }

        let previous = self.state();
        self.enter_active()?;
        self.generate_section(section, &prepared.globals).await;
        self.set_state(previous);
        self.control.reset();

        self.records
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("section {id}")))
    }

    fn prepared_plan(&self) -> Result<Arc<Prepared>> {
        self.prepared
            .read()
            .clone()
            .ok_or_else(|| Error::InvalidState("no report has been generated yet".into()))
    }
}

fn validate_plan(plan: &RunPlan) -> Result<()> {
    if plan.sections.is_empty() {
        return Err(Error::InvalidInput("report has no sections".into()));
    }
    if let Some(pos) = plan.sections.iter().position(|s| s.name.trim().is_empty()) {
        return Err(Error::InvalidInput(format!("section {} has an empty name", pos + 1)));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = plan.sections.iter().find(|s| !seen.insert(s.id())) {
        return Err(Error::InvalidInput(format!(
            "section \"{}\" reuses id {}",
            dup.name,
            dup.id()
        )));
    }
    Ok(())
}
