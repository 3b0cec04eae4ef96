use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use futures_util::future::join_all;
use rw_domain::config::IngestConfig;
use rw_domain::error::{Error, ErrorKind, Result};
use rw_domain::report::{file_extension, Document, DocumentKind};
use rw_domain::trace::TraceEvent;
use serde::Serialize;

/// Extensions accepted for ingestion.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "pdf", "docx", "txt", "md", "json", "eml", "xlsx", "xls", "csv",
];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Extractors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Turns raw file bytes into plain text.
///
/// Binary formats (PDF, DOCX, XLSX) need an extractor registered with
/// [`DocumentLoader::register`]; text-like formats are built in.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<String>;
}

/// UTF-8 text, invalid sequences replaced.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// CSV as a single sheet named after the file stem.
pub struct CsvExtractor;

impl TextExtractor for CsvExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let sheet = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
        let body = String::from_utf8_lossy(bytes);
        Ok(format!("Sheet: {sheet}\n{body}\n"))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Loader
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A file that could not be loaded. Loading continues past it.
#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    pub name: String,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub documents: Vec<Document>,
    pub failures: Vec<IngestFailure>,
}

#[derive(Clone)]
pub struct DocumentLoader {
    max_file_bytes: u64,
    extractors: HashMap<String, Arc<dyn TextExtractor>>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(&IngestConfig::default())
    }
}

impl DocumentLoader {
    pub fn new(cfg: &IngestConfig) -> Self {
        let mut loader = Self {
            max_file_bytes: cfg.max_file_bytes,
            extractors: HashMap::new(),
        };
        let text: Arc<dyn TextExtractor> = Arc::new(PlainTextExtractor);
        for ext in ["txt", "md", "json", "eml"] {
            loader.extractors.insert(ext.into(), text.clone());
        }
        loader.extractors.insert("csv".into(), Arc::new(CsvExtractor));
        loader
    }

    /// Register (or replace) the extractor for an extension.
    pub fn register(&mut self, extension: &str, extractor: Arc<dyn TextExtractor>) {
        self.extractors
            .insert(extension.to_ascii_lowercase(), extractor);
    }

    /// Reject unsupported or oversized files before any bytes are read.
    pub fn validate(&self, name: &str, size: u64) -> Result<DocumentKind> {
        let ext = file_extension(name).unwrap_or("").to_ascii_lowercase();
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(Error::UnsupportedFileType {
                name: name.to_string(),
                extension: ext,
            });
        }
        if size > self.max_file_bytes {
            return Err(Error::FileTooLarge {
                name: name.to_string(),
                size,
                limit: self.max_file_bytes,
            });
        }
        Ok(DocumentKind::from_extension(&ext))
    }

    /// Ingest an in-memory file.
    pub fn ingest_bytes(&self, name: &str, bytes: &[u8]) -> Result<Document> {
        let size = bytes.len() as u64;
        let kind = self.validate(name, size)?;
        let ext = file_extension(name).unwrap_or("").to_ascii_lowercase();

        let extractor = self.extractors.get(&ext).ok_or_else(|| Error::Parse {
            name: name.to_string(),
            message: format!("no text extractor registered for .{ext} files"),
        })?;
        let content = extractor
            .extract(name, bytes)
            .map_err(|e| match e {
                Error::Parse { .. } => e,
                other => Error::Parse {
                    name: name.to_string(),
                    message: other.to_string(),
                },
            })?
            .trim()
            .to_string();

        TraceEvent::DocumentIngested {
            name: name.to_string(),
            kind: kind.to_string(),
            size,
            content_chars: content.chars().count(),
        }
        .emit();

        Ok(Document::new(name, kind, size, content))
    }

    /// Ingest a file from disk. Size and type are checked from metadata
    /// before the file is read.
    pub async fn ingest_path(&self, path: &Path) -> Result<Document> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidInput(format!("not a file path: {}", path.display())))?;
        let meta = tokio::fs::metadata(path).await?;
        self.validate(&name, meta.len())?;
        let bytes = tokio::fs::read(path).await?;
        self.ingest_bytes(&name, &bytes)
    }

    /// Ingest every path concurrently. Failures are collected per file;
    /// documents keep the input order.
    pub async fn ingest_all<P: AsRef<Path>>(&self, paths: &[P]) -> IngestOutcome {
        let results = join_all(paths.iter().map(|p| self.ingest_path(p.as_ref()))).await;

        let mut outcome = IngestOutcome::default();
        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(doc) => outcome.documents.push(doc),
                Err(e) => {
                    let name = path.as_ref().display().to_string();
                    tracing::warn!(file = %name, error = %e, "document skipped");
                    outcome.failures.push(IngestFailure {
                        name,
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_extension() {
        let loader = DocumentLoader::default();
        let err = loader.validate("archive.zip", 10).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType { ref extension, .. } if extension == "zip"));
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn rejects_oversized_before_reading() {
        let loader = DocumentLoader::default();
        let err = loader.validate("big.pdf", 10 * 1024 * 1024 + 1).unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { .. }));
        assert!(loader.validate("ok.pdf", 10 * 1024 * 1024).is_ok());
    }

    #[test]
    fn text_is_trimmed() {
        let loader = DocumentLoader::default();
        let doc = loader.ingest_bytes("notes.MD", b"  \n# Notes\nbody\n\n").unwrap();
        assert_eq!(doc.content, "# Notes\nbody");
        assert_eq!(doc.kind, DocumentKind::Text);
        assert_eq!(doc.size, 17);
    }

    #[test]
    fn csv_becomes_a_sheet() {
        let loader = DocumentLoader::default();
        let doc = loader.ingest_bytes("sales.csv", b"a,b\n1,2").unwrap();
        assert_eq!(doc.kind, DocumentKind::Spreadsheet);
        assert_eq!(doc.content, "Sheet: sales\na,b\n1,2");
    }

    #[test]
    fn binary_format_without_extractor_is_parse_error() {
        let loader = DocumentLoader::default();
        let err = loader.ingest_bytes("report.pdf", b"%PDF-1.7").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("report.pdf"));
    }

    struct FailingExtractor;

    impl TextExtractor for FailingExtractor {
        fn extract(&self, _name: &str, _bytes: &[u8]) -> Result<String> {
            Err(Error::Other("PDF is password protected.".into()))
        }
    }

    struct FixedExtractor(&'static str);

    impl TextExtractor for FixedExtractor {
        fn extract(&self, _name: &str, _bytes: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn registered_extractor_is_used() {
        let mut loader = DocumentLoader::default();
        loader.register("DOCX", Arc::new(FixedExtractor(" extracted text ")));
        let doc = loader.ingest_bytes("memo.docx", b"PK..").unwrap();
        assert_eq!(doc.content, "extracted text");
        assert_eq!(doc.kind, DocumentKind::WordProcessor);
    }

    #[test]
    fn extractor_errors_become_parse_errors() {
        let mut loader = DocumentLoader::default();
        loader.register("pdf", Arc::new(FailingExtractor));
        let err = loader.ingest_bytes("locked.pdf", b"%PDF").unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to process locked.pdf: PDF is password protected."
        );
    }
}
