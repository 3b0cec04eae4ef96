use std::sync::Arc;

use serde::Serialize;

use rw_contextpack::TokenEstimator;
use rw_domain::config::Config;
use rw_sessions::ChatHistory;

use super::build_provider;
use crate::runtime::{SectionAssistant, SectionSuggestion, SessionBudgetGuard};

#[derive(Serialize)]
struct SuggestedSections<'a> {
    sections: &'a [SectionSuggestion],
}

/// Suggestions as `[[sections]]` tables, ready to paste into a report
/// definition.
pub fn render_sections(suggestions: &[SectionSuggestion]) -> anyhow::Result<String> {
    toml::to_string_pretty(&SuggestedSections {
        sections: suggestions,
    })
    .map_err(|e| anyhow::anyhow!("serializing suggestions: {e}"))
}

pub async fn run(config: Config, description: &str, clear: bool, dry_run: bool) -> anyhow::Result<()> {
    let history = ChatHistory::new(&config.session.state_path);
    if clear {
        history.clear()?;
    }

    let assistant = SectionAssistant::new(
        build_provider(&config, dry_run)?,
        Arc::new(SessionBudgetGuard::from_config(&config)),
        TokenEstimator::from_config(&config.budget),
        history,
        config.llm.model.clone(),
    );
    let reply = assistant
        .ask(description)
        .await
        .map_err(|e| anyhow::anyhow!("{e} ({})", e.kind().hint()))?;

    if reply.suggestions.is_empty() {
        println!("{}", reply.text);
    } else {
        print!("{}", render_sections(&reply.suggestions)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_sections_read_as_a_report_definition() {
        let rendered = render_sections(&[SectionSuggestion {
            name: "Risks".into(),
            instructions: "List the top five.".into(),
        }])
        .unwrap();
        assert!(rendered.contains("[[sections]]"));

        let def = crate::cli::report_file::ReportDefinition::parse(&rendered, Default::default()).unwrap();
        assert_eq!(def.file.sections[0].name, "Risks");
        assert_eq!(def.file.sections[0].instructions, "List the top five.");
    }
}
