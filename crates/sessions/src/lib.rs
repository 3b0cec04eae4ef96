//! Best-effort local persistence for reportwright.
//!
//! The project store keeps the report title and section definitions
//! (document names and sizes only, never their content). The chat log is
//! an append-only JSONL file. Global documents and session spend are
//! never written.

pub mod chat;
pub mod store;

pub use chat::{ChatHistory, ChatLine};
pub use store::{PersistedDocument, PersistedSection, ProjectState, ProjectStore};
