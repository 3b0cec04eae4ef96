use std::path::Path;

use serde::Serialize;

use rw_contextpack::tokens::{format_compact_count, format_token_count};
use rw_contextpack::{CostBreakdown, CostEstimate, CostEstimator, GenerationCostProjector, RateLimitStatus};
use rw_documents::DocumentLoader;
use rw_domain::config::Config;

use super::report_file::ReportDefinition;

#[derive(Debug, Serialize)]
pub struct Estimate {
    pub title: String,
    pub model: String,
    pub breakdown: CostBreakdown,
    pub cost: CostEstimate,
    pub rate_limit: RateLimitStatus,
    pub budget_usd: f64,
    pub skipped_files: Vec<String>,
}

impl Estimate {
    pub fn fits_budget(&self) -> bool {
        self.cost.total_cost <= self.budget_usd
    }
}

/// Project a report definition without touching the network.
pub fn estimate(config: &Config, report: &Path, model: Option<&str>) -> anyhow::Result<Estimate> {
    let def = ReportDefinition::load(report)?;
    let loader = DocumentLoader::new(&config.ingest);
    let (sections, globals, failures) = def.stat_documents(&loader);

    let model = model.unwrap_or(&config.llm.model).to_string();
    let breakdown = GenerationCostProjector::from_config(&config.budget)
        .with_review(config.generation.run_review)
        .project(&sections, &globals);
    let pricing = CostEstimator::new(config.pricing.clone());

    Ok(Estimate {
        title: def.title().to_string(),
        cost: pricing.estimate_cost(breakdown.total_tokens, &model),
        rate_limit: pricing.check_rate_limits(breakdown.total_tokens, &model),
        model,
        breakdown,
        budget_usd: config.session.max_budget_usd,
        skipped_files: failures
            .into_iter()
            .map(|f| format!("{}: {} ({})", f.name, f.message, f.kind.hint()))
            .collect(),
    })
}

pub fn render(est: &Estimate) -> String {
    let mut out = String::new();
    let title = if est.title.is_empty() { "(untitled)" } else { &est.title };
    out.push_str(&format!("Report: {title}\nModel:  {}\n\n", est.model));

    for s in &est.breakdown.sections {
        let tag = if s.overview { " [overview]" } else { "" };
        out.push_str(&format!(
            "  {:<32} {:>14}{tag}\n",
            s.name,
            format_token_count(s.tokens)
        ));
    }
    let b = &est.breakdown;
    out.push_str(&format!(
        "\n  global documents  {}\n  regular sections  {}\n  overview sections {}\n  review stage      {}\n  total             {}\n",
        format_compact_count(b.global_tokens),
        format_compact_count(b.regular_tokens),
        format_compact_count(b.overview_tokens),
        format_compact_count(b.review_tokens),
        format_token_count(b.total_tokens),
    ));

    out.push_str(&format!(
        "\nEstimated cost: ${:.2} (input ${:.2}, output ${:.2}), budget ${:.2}\n",
        est.cost.total_cost, est.cost.input_cost, est.cost.output_cost, est.budget_usd
    ));
    if !est.fits_budget() {
        out.push_str("WARNING: estimate exceeds the session budget\n");
    }
    out.push_str(&format!(
        "Rate limit: {:.1}% of {} tokens/minute",
        est.rate_limit.percentage, est.rate_limit.limit
    ));
    if est.rate_limit.exceeded {
        out.push_str(" (exceeded, expect throttling)");
    }
    out.push('\n');

    for skipped in &est.skipped_files {
        out.push_str(&format!("skipped {skipped}\n"));
    }
    out
}
