use serde::{Deserialize, Serialize};

/// Token usage for a completion, as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Usage accounting attached to a completion.
///
/// Providers are not required to report usage; when they do not, callers
/// fall back to estimating from the prompt and response text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum UsageReport {
    Reported(Usage),
    Unreported,
}

impl UsageReport {
    pub fn from_option(usage: Option<Usage>) -> Self {
        match usage {
            Some(u) => Self::Reported(u),
            None => Self::Unreported,
        }
    }

    /// Billable token count: the reported total, or `estimate()` when the
    /// provider did not say.
    pub fn billable_tokens(&self, estimate: impl FnOnce() -> u64) -> u64 {
        match self {
            Self::Reported(u) => u.total_tokens,
            Self::Unreported => estimate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_usage_wins() {
        let report = UsageReport::Reported(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        });
        assert_eq!(report.billable_tokens(|| 999), 15);
    }

    #[test]
    fn unreported_falls_back_to_estimate() {
        assert_eq!(UsageReport::Unreported.billable_tokens(|| 42), 42);
        assert_eq!(UsageReport::from_option(None), UsageReport::Unreported);
    }
}
