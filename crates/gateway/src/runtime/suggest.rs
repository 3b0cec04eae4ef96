//! Section assistant: asks the model for a section outline and parses the
//! `Section N:` / `Instructions:` lines it answers with.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Serialize;

use rw_contextpack::TokenEstimator;
use rw_domain::error::Result;
use rw_domain::message::{Message, Role};
use rw_domain::report::Section;
use rw_providers::{ChatRequest, LlmProvider};
use rw_sessions::{ChatHistory, ChatLine};

use super::budget::SessionBudgetGuard;
use super::call::complete;
use super::prompts::ASSISTANT_SYSTEM_PROMPT;

const ASSISTANT_TEMPERATURE: f32 = 0.8;
const ASSISTANT_MAX_TOKENS: u32 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSuggestion {
    pub name: String,
    pub instructions: String,
}

impl SectionSuggestion {
    pub fn to_section(&self) -> Section {
        Section::new(self.name.clone(), self.instructions.clone())
    }
}

fn section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^Section\s+\d+:\s*(.+)$").expect("static pattern"))
}

fn instructions_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^Instructions?:\s*(.+)$").expect("static pattern"))
}

/// Parse an assistant reply into suggestions.
///
/// Lines after an `Instructions:` line are appended to it until the next
/// `Section N:` header. Lines before the first header are ignored.
pub fn parse_suggestions(text: &str) -> Vec<SectionSuggestion> {
    let mut out = Vec::new();
    let mut current: Option<SectionSuggestion> = None;

    for line in text.lines().map(str::trim) {
        if let Some(caps) = section_re().captures(line) {
            if let Some(done) = current.take() {
                out.push(done);
            }
            current = Some(SectionSuggestion {
                name: caps[1].trim().to_string(),
                instructions: String::new(),
            });
            continue;
        }
        let Some(section) = current.as_mut() else {
            continue;
        };
        if let Some(caps) = instructions_re().captures(line) {
            section.instructions = caps[1].trim().to_string();
            continue;
        }
        if !section.instructions.is_empty() && !line.is_empty() {
            section.instructions.push(' ');
            section.instructions.push_str(line);
        }
    }
    out.extend(current);
    out
}

/// Conversational helper that proposes report sections.
pub struct SectionAssistant {
    provider: Arc<dyn LlmProvider>,
    budget: Arc<SessionBudgetGuard>,
    estimator: TokenEstimator,
    history: ChatHistory,
    model: String,
}

/// One assistant turn.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    pub text: String,
    pub suggestions: Vec<SectionSuggestion>,
    pub cost_usd: f64,
}

impl SectionAssistant {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        budget: Arc<SessionBudgetGuard>,
        estimator: TokenEstimator,
        history: ChatHistory,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            budget,
            estimator,
            history,
            model: model.into(),
        }
    }

    /// Send `message` with the stored conversation and persist both sides.
    pub async fn ask(&self, message: &str) -> Result<AssistantReply> {
        let mut messages = vec![Message::system(ASSISTANT_SYSTEM_PROMPT)];
        for line in self.history.lines()? {
            messages.push(Message {
                role: line.role,
                content: line.content,
            });
        }
        messages.push(Message::user(message));

        let req = ChatRequest::new(messages)
            .with_model(self.model.clone())
            .with_temperature(ASSISTANT_TEMPERATURE)
            .with_max_tokens(ASSISTANT_MAX_TOKENS);
        let done = complete(self.provider.as_ref(), &self.budget, &self.estimator, &req).await?;

        self.history.append(&[
            ChatLine::now(Role::User, message),
            ChatLine::now(Role::Assistant, &done.content),
        ])?;

        let suggestions = parse_suggestions(&done.content);
        tracing::info!(suggestions = suggestions.len(), "assistant replied");
        Ok(AssistantReply {
            text: done.content,
            suggestions,
            cost_usd: done.cost_usd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rw_contextpack::CostEstimator;
    use rw_domain::config::PriceTable;
    use rw_providers::ScriptedProvider;

    #[test]
    fn parses_simple_outline() {
        let text = "Here you go:\n\nSection 1: Executive Summary\nInstructions: Summarize the findings.\n\nSection 2: Risks\nInstruction: List the top risks.";
        let got = parse_suggestions(text);
        assert_eq!(
            got,
            vec![
                SectionSuggestion {
                    name: "Executive Summary".into(),
                    instructions: "Summarize the findings.".into(),
                },
                SectionSuggestion {
                    name: "Risks".into(),
                    instructions: "List the top risks.".into(),
                },
            ]
        );
    }

    #[test]
    fn joins_multiline_instructions() {
        let text = "Section 1: Market\nInstructions: Cover size\n  and growth\nover five years.\nSection 2: Team";
        let got = parse_suggestions(text);
        assert_eq!(got[0].instructions, "Cover size and growth over five years.");
        assert_eq!(got[1].name, "Team");
        assert_eq!(got[1].instructions, "");
    }

    #[test]
    fn header_match_is_case_insensitive() {
        let got = parse_suggestions("section 3: Appendix\ninstructions: Raw tables.");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "Appendix");
    }

    #[test]
    fn prose_without_headers_yields_nothing() {
        assert!(parse_suggestions("I need more detail about your report.").is_empty());
    }

    #[tokio::test]
    async fn ask_persists_the_exchange() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(
            ScriptedProvider::new("gpt-4o")
                .reply("quarterly", "Section 1: Revenue\nInstructions: Break down revenue."),
        );
        let budget = Arc::new(SessionBudgetGuard::new(CostEstimator::new(PriceTable::default()), 5.0));
        let assistant = SectionAssistant::new(
            provider.clone(),
            budget,
            TokenEstimator::default(),
            ChatHistory::new(dir.path()),
            "gpt-4o",
        );

        let reply = assistant.ask("A quarterly business review").await.unwrap();
        assert_eq!(reply.suggestions.len(), 1);
        assert_eq!(reply.suggestions[0].to_section().name, "Revenue");

        assistant.ask("Add more").await.unwrap();

        let history = ChatHistory::new(dir.path()).lines().unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);

        // The second call carried the first exchange.
        assert!(provider.dispatched()[1].contains("Break down revenue."));
    }
}
