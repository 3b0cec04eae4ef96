//! Report generation runtime and the `reportwright` command line.

pub mod cli;
pub mod runtime;
