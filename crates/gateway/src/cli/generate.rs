use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use rw_contextpack::tokens::format_token_count;
use rw_documents::export::{export, sanitize_file_name};
use rw_documents::{DocumentLoader, HtmlEncoder};
use rw_domain::config::{Config, GenerationMode};
use rw_sessions::ProjectStore;

use super::report_file::ReportDefinition;
use super::{build_provider, GenerateArgs};
use crate::runtime::{
    GenerationOrchestrator, GenerationRecord, ReviewOutcome, RunReport, RunState, SectionStatus,
    SessionBudgetGuard,
};

/// Fold command-line overrides into the loaded config.
pub fn apply_overrides(config: &mut Config, args: &GenerateArgs) {
    if let Some(model) = &args.model {
        config.llm.model = model.clone();
    }
    if let Some(budget) = args.max_budget {
        config.session.max_budget_usd = budget;
    }
    if args.no_review {
        config.generation.run_review = false;
    }
    if args.sequential {
        config.generation.mode = GenerationMode::Sequential;
    }
}

/// Run a full generation. Returns `true` when the run completed.
pub async fn run(mut config: Config, args: GenerateArgs) -> anyhow::Result<bool> {
    apply_overrides(&mut config, &args);

    let def = ReportDefinition::load(&args.report)?;
    let loader = DocumentLoader::new(&config.ingest);
    let (plan, failures) = def.ingest(&loader).await;
    for f in &failures {
        eprintln!("skipped {}: {} ({})", f.name, f.message, f.kind.hint());
    }

    let provider = build_provider(&config, args.dry_run)?;
    let budget = Arc::new(SessionBudgetGuard::from_config(&config));
    let orchestrator = GenerationOrchestrator::new(&config, provider, budget);

    let control = orchestrator.control();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("cancelling after the sections in flight...");
            control.cancel();
        }
    });

    let sections = plan.sections.clone();
    eprintln!(
        "Generating {} section(s) with {}...",
        sections.len(),
        orchestrator.model()
    );
    let report = orchestrator
        .run(plan)
        .await
        .map_err(|e| anyhow::anyhow!("{e} ({})", e.kind().hint()))?;

    for record in &report.sections {
        eprintln!("{}", status_line(record));
    }
    match &report.review {
        ReviewOutcome::Skipped => {}
        ReviewOutcome::Unified { tokens, .. } => {
            eprintln!("  review: unified ({})", format_token_count(*tokens));
        }
        ReviewOutcome::Failed { message, kind } => {
            eprintln!("  review: failed: {message} ({})", kind.hint());
        }
    }

    if report.completed() > 0 {
        let written = write_outputs(&report, args.output.as_deref())?;
        for path in written {
            eprintln!("wrote {}", path.display());
        }
    }

    persist(&config, &report.title, &sections);

    eprintln!(
        "{} complete, {} failed, spent ${:.2} of ${:.2}",
        report.completed(),
        report.failed(),
        report.spent_usd,
        config.session.max_budget_usd
    );
    Ok(report.state == RunState::Complete)
}

fn status_line(record: &GenerationRecord) -> String {
    match record.status {
        SectionStatus::Complete => format!(
            "  [complete] {} ({}, ${:.2})",
            record.name,
            format_token_count(record.tokens),
            record.cost_usd
        ),
        SectionStatus::Error => {
            let hint = record.error_kind.map(|k| k.hint()).unwrap_or_default();
            format!(
                "  [error] {}: {} ({hint})",
                record.name,
                record.error.as_deref().unwrap_or("unknown error")
            )
        }
        other => format!("  [{}] {}", other.as_str(), record.name),
    }
}

/// Write the markdown report and its HTML preview. Returns the paths.
pub fn write_outputs(report: &RunReport, output: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
    let text = report.final_text();
    let md_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{}.md", sanitize_file_name(&report.title))));
    std::fs::write(&md_path, &text).with_context(|| format!("writing {}", md_path.display()))?;

    let preview = export(&report.title, &text, &HtmlEncoder)?;
    let html_path = md_path.with_file_name(preview.file_name);
    std::fs::write(&html_path, &preview.bytes)
        .with_context(|| format!("writing {}", html_path.display()))?;

    Ok(vec![md_path, html_path])
}

/// Best effort: a failure here is logged, never fatal.
fn persist(config: &Config, title: &str, sections: &[rw_domain::report::Section]) {
    let result = ProjectStore::new(&config.session.state_path).and_then(|store| {
        store.set_title(title);
        store.save_sections(sections);
        store.flush()
    });
    if let Err(e) = result {
        tracing::warn!(error = %e, "could not persist project state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rw_domain::report::SectionId;
    use uuid::Uuid;

    fn args(report: PathBuf) -> GenerateArgs {
        GenerateArgs {
            report,
            output: None,
            no_review: false,
            max_budget: None,
            model: None,
            sequential: false,
            dry_run: true,
        }
    }

    #[test]
    fn overrides_win_over_config() {
        let mut config = Config::default();
        let mut a = args(PathBuf::from("r.toml"));
        a.model = Some("gpt-4o-mini".into());
        a.max_budget = Some(1.5);
        a.no_review = true;
        a.sequential = true;
        apply_overrides(&mut config, &a);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.session.max_budget_usd, 1.5);
        assert!(!config.generation.run_review);
        assert_eq!(config.generation.mode, GenerationMode::Sequential);
    }

    #[test]
    fn error_lines_carry_a_hint() {
        let record = GenerationRecord {
            section_id: SectionId::from("x"),
            name: "Risks".into(),
            overview: false,
            status: SectionStatus::Error,
            content: None,
            error: Some("budget exceeded".into()),
            error_kind: Some(rw_domain::error::ErrorKind::Budget),
            tokens: 0,
            cost_usd: 0.0,
            attempts: 1,
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(
            status_line(&record),
            "  [error] Risks: budget exceeded (raise your budget or stop)"
        );
    }

    #[test]
    fn outputs_land_next_to_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let report = RunReport {
            run_id: Uuid::nil(),
            title: "Ops Review".into(),
            state: RunState::Complete,
            sections: Vec::new(),
            review: ReviewOutcome::Unified {
                content: "# Ops\n\n- item".into(),
                tokens: 10,
                cost_usd: 0.0,
            },
            spent_usd: 0.0,
        };
        let out = dir.path().join("final.md");
        let written = write_outputs(&report, Some(&out)).unwrap();
        assert_eq!(written[0], out);
        assert_eq!(written[1], dir.path().join("Ops_Review.html"));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "# Ops\n\n- item");
        assert!(std::fs::read_to_string(&written[1]).unwrap().contains("<li>"));
    }

    #[tokio::test]
    async fn dry_run_writes_a_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.toml");
        std::fs::write(
            &report,
            "title = \"Dry\"\n\n[[sections]]\nname = \"One\"\ninstructions = \"x\"\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.session.state_path = dir.path().join("state");
        let mut a = args(report);
        a.output = Some(dir.path().join("dry.md"));

        let ok = run(config, a).await.unwrap();
        assert!(ok);
        assert!(dir.path().join("dry.md").exists());
        assert!(dir.path().join("state").join("project.json").exists());
    }
}
