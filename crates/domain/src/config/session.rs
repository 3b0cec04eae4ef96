use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-session spend ceiling and persisted project state location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "d_max_budget")]
    pub max_budget_usd: f64,
    #[serde(default = "d_state_path")]
    pub state_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_budget_usd: d_max_budget(),
            state_path: d_state_path(),
        }
    }
}

fn d_max_budget() -> f64 {
    5.0
}
fn d_state_path() -> PathBuf {
    PathBuf::from(".reportwright")
}
