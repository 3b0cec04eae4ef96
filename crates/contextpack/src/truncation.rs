use rw_domain::report::Document;

use crate::tokens::TokenEstimator;

const MARKER_HEAD: &str = "\n\n[... Content truncated due to length. Total length: ";
const MARKER_TAIL: &str = " characters ...]";

/// Marker appended to truncated content. `total_chars` is the length of
/// the untruncated text.
pub fn truncation_marker(total_chars: usize) -> String {
    format!("{MARKER_HEAD}{total_chars}{MARKER_TAIL}")
}

/// Split a trailing truncation marker off `text`, returning the kept body
/// and the original length it records.
fn split_marker(text: &str) -> Option<(&str, usize)> {
    let at = text.rfind(MARKER_HEAD)?;
    let total = text[at + MARKER_HEAD.len()..]
        .strip_suffix(MARKER_TAIL)?
        .parse()
        .ok()?;
    Some((&text[..at], total))
}

/// Cut `text` down to `max_tokens` worth of characters and append the
/// truncation marker.
///
/// Text already within the limit is returned unchanged with `false`.
pub fn truncate_text(est: &TokenEstimator, text: &str, max_tokens: u64) -> (String, bool) {
    if est.estimate_tokens(text) <= max_tokens {
        return (text.to_string(), false);
    }
    (cut_with_marker(est, text, text.chars().count(), max_tokens), true)
}

fn cut_with_marker(est: &TokenEstimator, body: &str, total_chars: usize, max_tokens: u64) -> String {
    let keep = est.chars_for_tokens(max_tokens);
    let mut result: String = body.chars().take(keep).collect();
    result.push_str(&truncation_marker(total_chars));
    result
}

/// Shorten a document's content to `max_tokens`. A document that already
/// carries a truncation marker is cut from its kept body, and the marker
/// keeps the original length.
pub fn truncate_document(est: &TokenEstimator, doc: &Document, max_tokens: u64) -> String {
    match split_marker(&doc.content).filter(|_| doc.truncated) {
        Some((body, total_chars)) if est.estimate_tokens(&doc.content) > max_tokens => {
            cut_with_marker(est, body, total_chars, max_tokens)
        }
        _ => truncate_text(est, &doc.content, max_tokens).0,
    }
}

/// Cap every document at the per-document maximum, recording its
/// pre-truncation size in `original_tokens`. Documents already marked
/// truncated are left as they are.
pub fn summarize_documents(est: &TokenEstimator, docs: &[Document]) -> Vec<Document> {
    docs.iter().map(|doc| summarize_document(est, doc)).collect()
}

pub fn summarize_document(est: &TokenEstimator, doc: &Document) -> Document {
    let original = est.estimate_tokens(&doc.content);
    let mut out = doc.clone();
    out.original_tokens = Some(doc.original_tokens.unwrap_or(original));
    if !doc.truncated && original > est.max_document_tokens() {
        let (content, _) = truncate_text(est, &doc.content, est.max_document_tokens());
        out.content = content;
        out.truncated = true;
    }
    out
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
