//! Shared types for the reportwright crates: the report data model,
//! configuration tree, error taxonomy and structured trace events.

pub mod config;
pub mod error;
pub mod message;
pub mod report;
pub mod trace;
pub mod usage;
