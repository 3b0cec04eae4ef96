pub mod config;
pub mod estimate;
pub mod generate;
pub mod report_file;
pub mod suggest;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use rw_domain::config::Config;
use rw_providers::{LlmProvider, OpenAiCompatProvider, ScriptedProvider};

/// reportwright: multi-section report generation with token budgeting.
#[derive(Debug, Parser)]
#[command(name = "reportwright", version, about)]
pub struct Cli {
    /// Emit logs as JSON lines instead of compact text.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Project token usage and cost for a report definition. No network.
    Estimate {
        /// Path to the report definition (TOML).
        report: PathBuf,
        /// Model to price against (defaults to `llm.model`).
        #[arg(long)]
        model: Option<String>,
        /// Print the breakdown as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Generate a report.
    Generate(GenerateArgs),
    /// Ask the assistant to suggest report sections.
    Suggest {
        /// What the report is about.
        description: String,
        /// Forget the stored conversation first.
        #[arg(long)]
        clear: bool,
        /// Answer from an offline placeholder model.
        #[arg(long)]
        dry_run: bool,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, clap::Args)]
pub struct GenerateArgs {
    /// Path to the report definition (TOML).
    pub report: PathBuf,
    /// Where to write the markdown report (default: `<title>.md`).
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Skip the final review and unify stage.
    #[arg(long)]
    pub no_review: bool,
    /// Session spend ceiling in USD.
    #[arg(long)]
    pub max_budget: Option<f64>,
    /// Model override (e.g. "gpt-4o-mini").
    #[arg(long)]
    pub model: Option<String>,
    /// Generate one section at a time.
    #[arg(long)]
    pub sequential: bool,
    /// Use an offline placeholder model instead of the configured provider.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `RW_CONFIG` (or
/// `reportwright.toml` by default). A missing file yields the defaults.
/// Returns the parsed [`Config`] and the path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path =
        std::env::var("RW_CONFIG").unwrap_or_else(|_| "reportwright.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        Config::default()
    };

    Ok((config, config_path))
}

/// The configured HTTP provider, or the offline scripted one.
pub fn build_provider(config: &Config, dry_run: bool) -> anyhow::Result<Arc<dyn LlmProvider>> {
    if dry_run {
        tracing::info!(model = %config.llm.model, "dry run, no requests leave this machine");
        return Ok(Arc::new(ScriptedProvider::new(config.llm.model.clone())));
    }
    let provider = OpenAiCompatProvider::from_config(&config.llm)
        .map_err(|e| anyhow::anyhow!("{e} ({})", e.kind().hint()))?;
    Ok(Arc::new(provider))
}
