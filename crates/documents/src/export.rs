use rw_domain::error::Result;
use serde::Serialize;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Block model
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A run of text, bold or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), bold: false }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self { text: text.into(), bold: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Title(String),
    Heading { level: u8, spans: Vec<Span> },
    Bullet(Vec<Span>),
    Paragraph(Vec<Span>),
}

/// Parse report text into blocks, starting with the title.
///
/// `#`, `##` and `###` lines become headings, `- ` lines become bullets,
/// and every other non-blank line is its own paragraph.
pub fn parse_blocks(title: &str, text: &str) -> Vec<Block> {
    let mut blocks = vec![Block::Title(title.trim().to_string())];
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let block = if let Some((level, rest)) = heading(trimmed) {
            Block::Heading { level, spans: parse_spans(rest) }
        } else if let Some(rest) = trimmed.strip_prefix("- ") {
            Block::Bullet(parse_spans(rest.trim()))
        } else {
            Block::Paragraph(parse_spans(trimmed))
        };
        blocks.push(block);
    }
    blocks
}

fn heading(line: &str) -> Option<(u8, &str)> {
    [("### ", 3), ("## ", 2), ("# ", 1)]
        .into_iter()
        .find_map(|(prefix, level)| line.strip_prefix(prefix).map(|rest| (level, rest.trim())))
}

/// Split on `**` markers. An unclosed marker is dropped and its text kept plain.
pub fn parse_spans(text: &str) -> Vec<Span> {
    let parts: Vec<&str> = text.split("**").collect();
    let closed = parts.len() % 2 == 1;
    let mut spans: Vec<Span> = Vec::new();

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        let is_last = i == parts.len() - 1;
        let bold = i % 2 == 1 && (closed || !is_last);
        match spans.last_mut() {
            Some(prev) if prev.bold == bold => prev.text.push_str(part),
            _ => spans.push(Span { text: (*part).to_string(), bold }),
        }
    }
    spans
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Encoders
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Renders a block list into a downloadable file format.
pub trait DocumentEncoder: Send + Sync {
    /// File extension without the dot.
    fn extension(&self) -> &'static str;
    fn encode(&self, blocks: &[Block]) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Parse `text` and encode it under a file name derived from `title`.
pub fn export(title: &str, text: &str, encoder: &dyn DocumentEncoder) -> Result<ExportedFile> {
    let blocks = parse_blocks(title, text);
    let bytes = encoder.encode(&blocks)?;
    Ok(ExportedFile {
        file_name: format!("{}.{}", sanitize_file_name(title), encoder.extension()),
        bytes,
    })
}

/// Replace everything except ASCII letters and digits with `_`.
pub fn sanitize_file_name(title: &str) -> String {
    let name: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() {
        "report".into()
    } else {
        name
    }
}

/// Standalone HTML page, used as the export preview.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEncoder;

impl DocumentEncoder for HtmlEncoder {
    fn extension(&self) -> &'static str {
        "html"
    }

    fn encode(&self, blocks: &[Block]) -> Result<Vec<u8>> {
        let title = blocks
            .iter()
            .find_map(|b| match b {
                Block::Title(t) => Some(t.as_str()),
                _ => None,
            })
            .unwrap_or("Report");

        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", escape_html(title)));
        out.push_str("</head>\n<body>\n");

        let mut in_list = false;
        for block in blocks {
            let is_bullet = matches!(block, Block::Bullet(_));
            if in_list && !is_bullet {
                out.push_str("</ul>\n");
                in_list = false;
            }
            match block {
                Block::Title(t) => {
                    out.push_str(&format!("<h1 class=\"title\">{}</h1>\n", escape_html(t)));
                }
                Block::Heading { level, spans } => {
                    // Report headings sit one level below the title.
                    let tag = (level + 1).min(6);
                    out.push_str(&format!("<h{tag}>{}</h{tag}>\n", render_spans(spans)));
                }
                Block::Bullet(spans) => {
                    if !in_list {
                        out.push_str("<ul>\n");
                        in_list = true;
                    }
                    out.push_str(&format!("<li>{}</li>\n", render_spans(spans)));
                }
                Block::Paragraph(spans) => {
                    out.push_str(&format!("<p>{}</p>\n", render_spans(spans)));
                }
            }
        }
        if in_list {
            out.push_str("</ul>\n");
        }
        out.push_str("</body>\n</html>\n");
        Ok(out.into_bytes())
    }
}

fn render_spans(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|s| {
            let text = escape_html(&s.text);
            if s.bold {
                format!("<strong>{text}</strong>")
            } else {
                text
            }
        })
        .collect()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_bullets_and_paragraphs() {
        let text = "# Overview\n\nFirst line\ncontinues here.\n\n## Details\n- one\n- **two**\n\n### Small\nTail";
        let blocks = parse_blocks("Annual Report", text);
        assert_eq!(
            blocks,
            vec![
                Block::Title("Annual Report".into()),
                Block::Heading { level: 1, spans: vec![Span::plain("Overview")] },
                Block::Paragraph(vec![Span::plain("First line")]),
                Block::Paragraph(vec![Span::plain("continues here.")]),
                Block::Heading { level: 2, spans: vec![Span::plain("Details")] },
                Block::Bullet(vec![Span::plain("one")]),
                Block::Bullet(vec![Span::bold("two")]),
                Block::Heading { level: 3, spans: vec![Span::plain("Small")] },
                Block::Paragraph(vec![Span::plain("Tail")]),
            ]
        );
    }

    #[test]
    fn four_hashes_is_a_paragraph() {
        let blocks = parse_blocks("T", "#### deep");
        assert_eq!(blocks[1], Block::Paragraph(vec![Span::plain("#### deep")]));
    }

    #[test]
    fn bold_spans() {
        assert_eq!(
            parse_spans("Revenue grew **12%** this year"),
            vec![
                Span::plain("Revenue grew "),
                Span::bold("12%"),
                Span::plain(" this year"),
            ]
        );
    }

    #[test]
    fn unclosed_bold_is_plain() {
        assert_eq!(
            parse_spans("a **b"),
            vec![Span::plain("a b")]
        );
    }

    #[test]
    fn file_name_is_sanitized() {
        assert_eq!(sanitize_file_name("Q3 Report: Final!"), "Q3_Report__Final_");
        assert_eq!(sanitize_file_name(""), "report");
    }

    #[test]
    fn html_escapes_and_groups_lists() {
        let file = export("A & B", "- x < y\n- z\n\nDone", &HtmlEncoder).unwrap();
        assert_eq!(file.file_name, "A___B.html");
        let html = String::from_utf8(file.bytes).unwrap();
        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("<ul>\n<li>x &lt; y</li>\n<li>z</li>\n</ul>\n<p>Done</p>"));
    }
}
