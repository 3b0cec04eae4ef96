use rw_domain::report::Document;

use crate::truncation::preview;

/// One document as it appears in a section prompt.
pub fn format_document_block(doc: &Document) -> String {
    format!("--- {} ---\n{}\n\n", doc.name, doc.content)
}

/// The `CONTEXT DOCUMENTS:` block, or an empty string when there are none.
pub fn format_context_documents(docs: &[Document]) -> String {
    if docs.is_empty() {
        return String::new();
    }
    let mut out = String::from("CONTEXT DOCUMENTS:\n");
    for doc in docs {
        out.push_str(&format_document_block(doc));
    }
    out
}

/// A finished section as seen by overview sections: heading plus a
/// preview of its content.
pub fn format_section_preview(name: &str, content: &str, max_chars: usize) -> String {
    format!("## {name}\n{}", preview(content, max_chars))
}

/// A finished section in the review prompt.
pub fn format_review_block(name: &str, content: &str) -> String {
    format!("\n## {name}\n\n{content}\n")
}
