//! Prompt text for section generation, the review stage and the section
//! assistant.

use rw_contextpack::injection::{format_context_documents, format_review_block};
use rw_domain::message::Message;
use rw_domain::report::Document;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional report writer.";

pub const DEFAULT_REPORT_TITLE: &str = "Professional Report";

const SECTION_FORMAT_RULES: &str = "Format: Markdown. Use proper headers (##, ###) but do NOT repeat the section title as an H1.\n\
CITATIONS: If you use information from the provided documents, cite them using [Doc Name] format.";

const REVIEW_SYSTEM_PROMPT: &str = "You are a senior editor. Your task is to review and unify a multi-section report to ensure:

1. Consistent tone and writing style throughout
2. No contradictions between sections
3. Smooth transitions between sections
4. Professional language
5. Coherent narrative flow
6. Proper formatting and structure

Make necessary adjustments to create a polished, cohesive final report. Do not add any information not present in the original sections.";

const REVIEW_CLOSING: &str = "\n\nPlease provide the complete unified report with all sections, ensuring consistency, professionalism, and coherent flow. Maintain all the important information from each section while improving overall quality and readability.";

pub const ASSISTANT_SYSTEM_PROMPT: &str = "You are an AI assistant helping users configure report structures. When users describe their report needs, suggest appropriate sections with clear instructions.

Respond with specific section suggestions in the following format:

Section 1: [Section Name]
Instructions: [Clear instructions for what this section should contain]

Section 2: [Section Name]
Instructions: [Clear instructions for what this section should contain]

And so on...

Be specific and practical. Tailor your suggestions to the type of report the user describes.";

/// Everything the section prompt needs.
pub struct SectionPrompt<'a> {
    pub base_prompt: Option<&'a str>,
    pub name: &'a str,
    pub instructions: &'a str,
    pub documents: &'a [Document],
    /// Names of sections already written; set for overview sections.
    pub previous_sections: &'a [String],
}

impl SectionPrompt<'_> {
    pub fn system(&self) -> String {
        let base = self
            .base_prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);
        let mut out = format!("{base}\n\nWrite a section titled \"{}\".\n\n", self.name);
        if !self.previous_sections.is_empty() {
            out.push_str("PREVIOUS SECTION CONTEXT (Connect to this):\n");
            out.push_str(&self.previous_sections.join(", "));
            out.push_str("\n\n");
        }
        out.push_str(SECTION_FORMAT_RULES);
        out
    }

    pub fn user(&self) -> String {
        format!(
            "Instructions: {}\n\n{}",
            self.instructions,
            format_context_documents(self.documents)
        )
    }

    pub fn messages(&self) -> Vec<Message> {
        vec![Message::system(self.system()), Message::user(self.user())]
    }
}

/// The unify call: every finished section under its own heading.
pub fn review_messages(title: &str, sections: &[(String, String)]) -> Vec<Message> {
    let title = if title.trim().is_empty() {
        DEFAULT_REPORT_TITLE
    } else {
        title
    };
    let mut user = format!(
        "Please review and unify the following report sections into a cohesive final report:\n\nReport Title: {title}\n\n"
    );
    for (name, content) in sections {
        user.push_str(&format_review_block(name, content));
    }
    user.push_str(REVIEW_CLOSING);
    vec![Message::system(REVIEW_SYSTEM_PROMPT), Message::user(user)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_system_prompt_names_the_section() {
        let p = SectionPrompt {
            base_prompt: None,
            name: "Findings",
            instructions: "List them",
            documents: &[],
            previous_sections: &[],
        };
        let sys = p.system();
        assert!(sys.starts_with(DEFAULT_SYSTEM_PROMPT));
        assert!(sys.contains("Write a section titled \"Findings\"."));
        assert!(sys.contains("[Doc Name]"));
        assert!(!sys.contains("PREVIOUS SECTION CONTEXT"));
    }

    #[test]
    fn custom_base_prompt_replaces_default() {
        let p = SectionPrompt {
            base_prompt: Some("You write audit memos."),
            name: "X",
            instructions: "",
            documents: &[],
            previous_sections: &[],
        };
        assert!(p.system().starts_with("You write audit memos."));

        let blank = SectionPrompt {
            base_prompt: Some("  "),
            ..p
        };
        assert!(blank.system().starts_with(DEFAULT_SYSTEM_PROMPT));
    }

    #[test]
    fn user_prompt_lists_documents() {
        let docs = vec![Document::text("notes.md", "alpha")];
        let p = SectionPrompt {
            base_prompt: None,
            name: "X",
            instructions: "Summarize",
            documents: &docs,
            previous_sections: &[],
        };
        assert_eq!(
            p.user(),
            "Instructions: Summarize\n\nCONTEXT DOCUMENTS:\n--- notes.md ---\nalpha\n\n"
        );
        assert_eq!(p.messages().len(), 2);
    }

    #[test]
    fn overview_prompt_mentions_previous_sections() {
        let prev = vec!["Intro".to_string(), "Method".to_string()];
        let p = SectionPrompt {
            base_prompt: None,
            name: "Summary",
            instructions: "",
            documents: &[],
            previous_sections: &prev,
        };
        assert!(p
            .system()
            .contains("PREVIOUS SECTION CONTEXT (Connect to this):\nIntro, Method\n"));
    }

    #[test]
    fn review_prompt_includes_every_section() {
        let msgs = review_messages(
            "",
            &[
                ("Intro".to_string(), "Hello".to_string()),
                ("End".to_string(), "Bye".to_string()),
            ],
        );
        let user = &msgs[1].content;
        assert!(user.contains("Report Title: Professional Report"));
        assert!(user.contains("\n## Intro\n\nHello\n"));
        assert!(user.contains("\n## End\n\nBye\n"));
        assert!(msgs[0].content.starts_with("You are a senior editor."));
    }
}
