mod budget;
mod generation;
mod ingest;
mod llm;
mod pricing;
mod session;

pub use budget::*;
pub use generation::*;
pub use ingest::*;
pub use llm::*;
pub use pricing::*;
pub use session::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub budget: TokenBudgetConfig,
    #[serde(default)]
    pub pricing: PriceTable,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.budget.chars_per_token == 0 {
            errors.push(ConfigError::error(
                "budget.chars_per_token",
                "must be greater than 0",
            ));
        }
        if self.budget.max_section_context_tokens == 0 {
            errors.push(ConfigError::error(
                "budget.max_section_context_tokens",
                "must be greater than 0",
            ));
        }
        if self.budget.max_document_tokens > self.budget.max_section_context_tokens {
            errors.push(ConfigError::warning(
                "budget.max_document_tokens",
                "exceeds max_section_context_tokens; a single document can fill a call",
            ));
        }
        if self.budget.context_share_percent > 100 {
            errors.push(ConfigError::error(
                "budget.context_share_percent",
                "must be between 0 and 100",
            ));
        }

        if self.pricing.models.is_empty() {
            errors.push(ConfigError::warning(
                "pricing.models",
                "no models priced; estimates use a built-in fallback rate",
            ));
        } else if !self.pricing.is_known(&self.pricing.default_model) {
            errors.push(ConfigError::error(
                "pricing.default_model",
                format!("'{}' has no entry in pricing.models", self.pricing.default_model),
            ));
        }
        if !self.pricing.output_ratio.is_finite() || self.pricing.output_ratio < 0.0 {
            errors.push(ConfigError::error(
                "pricing.output_ratio",
                "must be a non-negative number",
            ));
        }
        for (name, p) in &self.pricing.models {
            if p.input_per_1k < 0.0 || p.output_per_1k < 0.0 {
                errors.push(ConfigError::error(
                    format!("pricing.models.{name}"),
                    "prices must not be negative",
                ));
            }
        }

        if self.llm.base_url.is_empty() {
            errors.push(ConfigError::error("llm.base_url", "must not be empty"));
        }
        if self.llm.model.is_empty() {
            errors.push(ConfigError::error("llm.model", "must not be empty"));
        } else if !self.pricing.is_known(&self.llm.model) {
            errors.push(ConfigError::warning(
                "llm.model",
                format!(
                    "'{}' is not priced; costs use '{}' rates",
                    self.llm.model, self.pricing.default_model
                ),
            ));
        }
        if self.llm.timeout_ms == 0 {
            errors.push(ConfigError::error("llm.timeout_ms", "must be greater than 0"));
        }

        if !(0.0..=2.0).contains(&self.generation.section_temperature) {
            errors.push(ConfigError::warning(
                "generation.section_temperature",
                "outside the usual 0.0..=2.0 range",
            ));
        }
        if self.generation.default_concurrency == 0 || self.generation.fast_model_concurrency == 0 {
            errors.push(ConfigError::warning(
                "generation.default_concurrency",
                "concurrency of 0 is treated as 1",
            ));
        }

        if !self.session.max_budget_usd.is_finite() || self.session.max_budget_usd < 0.0 {
            errors.push(ConfigError::error(
                "session.max_budget_usd",
                "must be a non-negative number",
            ));
        } else if self.session.max_budget_usd == 0.0 {
            errors.push(ConfigError::warning(
                "session.max_budget_usd",
                "a zero budget rejects every call",
            ));
        }

        if self.ingest.max_file_bytes == 0 {
            errors.push(ConfigError::error("ingest.max_file_bytes", "must be greater than 0"));
        }

        errors
    }
}
