//! Report data model: documents, sections and their identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Documents
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Source format of a document. Drives the file-size token heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Text,
    Pdf,
    WordProcessor,
    Spreadsheet,
    Unknown,
}

impl DocumentKind {
    /// Classify by file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::WordProcessor,
            "xlsx" | "xls" | "csv" => Self::Spreadsheet,
            "txt" | "md" | "json" | "eml" => Self::Text,
            _ => Self::Unknown,
        }
    }

    /// Classify a file name by its last extension.
    pub fn from_file_name(name: &str) -> Self {
        match file_extension(name) {
            Some(ext) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Pdf => "pdf",
            Self::WordProcessor => "docx",
            Self::Spreadsheet => "spreadsheet",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Extension of `name` after the last `.`, if any.
pub fn file_extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

/// A named unit of text content that can be sent to the model.
///
/// `content` is always exactly what will be transmitted. `original_tokens`
/// records the pre-truncation size for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub kind: DocumentKind,
    /// Declared byte size of the source file.
    pub size: u64,
    #[serde(default)]
    pub content: String,
    /// Content was cut down by the per-document cap.
    #[serde(default)]
    pub truncated: bool,
    /// Content was cut down to fit the remaining budget of one call.
    #[serde(default)]
    pub partially_included: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_tokens: Option<u64>,
}

impl Document {
    pub fn new(name: impl Into<String>, kind: DocumentKind, size: u64, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
            content: content.into(),
            truncated: false,
            partially_included: false,
            original_tokens: None,
        }
    }

    /// A plain-text document whose declared size is its content length.
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let size = content.len() as u64;
        Self::new(name, DocumentKind::Text, size, content)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sections
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Stable identifier of a section. Join key for every per-section map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for SectionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One named unit of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    id: SectionId,
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_text: Option<String>,
    /// Generated after every regular section, with their output as context.
    #[serde(default)]
    pub overview: bool,
}

impl Section {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self::with_id(SectionId::new(), name, instructions)
    }

    pub fn with_id(id: SectionId, name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            instructions: instructions.into(),
            documents: Vec::new(),
            manual_text: None,
            overview: false,
        }
    }

    pub fn id(&self) -> &SectionId {
        &self.id
    }

    pub fn overview(mut self) -> Self {
        self.overview = true;
        self
    }

    pub fn with_document(mut self, doc: Document) -> Self {
        self.documents.push(doc);
        self
    }

    pub fn with_manual_text(mut self, text: impl Into<String>) -> Self {
        self.manual_text = Some(text.into());
        self
    }

    /// Manual text if it has any non-whitespace content.
    pub fn manual_text(&self) -> Option<&str> {
        self.manual_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

/// Split sections into (regular, overview), preserving relative order.
pub fn partition_sections(sections: &[Section]) -> (Vec<&Section>, Vec<&Section>) {
    sections.iter().partition(|s| !s.overview)
}
