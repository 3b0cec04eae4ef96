//! Core runtime: the orchestrator that ties context packing, budget
//! gating, LLM calls and per-section records into one report run.
//!
//! Entry point: [`GenerationOrchestrator::run`] takes a [`RunPlan`] and
//! returns a [`RunReport`].

pub mod budget;
pub mod call;
pub mod control;
pub mod orchestrator;
pub mod prompts;
pub mod records;
pub mod suggest;

pub use budget::{BudgetStatus, SessionBudgetGuard};
pub use control::RunControl;
pub use orchestrator::{GenerationOrchestrator, ReviewOutcome, RunPlan, RunReport};
pub use records::{GenerationRecord, RunState, SectionStatus};
pub use suggest::{parse_suggestions, AssistantReply, SectionAssistant, SectionSuggestion};
