use rw_domain::config::TokenBudgetConfig;
use rw_domain::report::{Document, DocumentKind};

/// Raw bytes assumed per PDF page.
const PDF_BYTES_PER_PAGE: u64 = 200_000;
/// Extractable tokens assumed per PDF page.
const PDF_TOKENS_PER_PAGE: u64 = 500;
/// Percent of a compressed word-processor file that is recoverable text.
const DOCX_TEXT_PERCENT: u64 = 30;
/// Tokens per KiB of raw spreadsheet data.
const SPREADSHEET_TOKENS_PER_KB: u64 = 50;
/// Bytes per token for formats we know nothing about.
const UNKNOWN_BYTES_PER_TOKEN: u64 = 10;

/// Character-ratio token estimator with a per-document ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEstimator {
    chars_per_token: u32,
    max_document_tokens: u64,
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::from_config(&TokenBudgetConfig::default())
    }
}

impl TokenEstimator {
    pub fn new(chars_per_token: u32, max_document_tokens: u64) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
            max_document_tokens,
        }
    }

    pub fn from_config(cfg: &TokenBudgetConfig) -> Self {
        Self::new(cfg.chars_per_token, cfg.max_document_tokens)
    }

    pub fn chars_per_token(&self) -> u32 {
        self.chars_per_token
    }

    pub fn max_document_tokens(&self) -> u64 {
        self.max_document_tokens
    }

    /// Estimated tokens in `text`: characters divided by the ratio, rounded up.
    pub fn estimate_tokens(&self, text: &str) -> u64 {
        let chars = text.chars().count() as u64;
        chars.div_ceil(u64::from(self.chars_per_token))
    }

    /// Number of characters that `tokens` tokens correspond to.
    pub fn chars_for_tokens(&self, tokens: u64) -> usize {
        usize::try_from(tokens.saturating_mul(u64::from(self.chars_per_token)))
            .unwrap_or(usize::MAX)
    }

    /// Estimate tokens from a file's declared size and kind, before any
    /// text is extracted. Always capped at the per-document maximum.
    pub fn estimate_file_tokens(&self, kind: DocumentKind, size: u64) -> u64 {
        let cpt = u64::from(self.chars_per_token);
        let raw = match kind {
            DocumentKind::Pdf => size
                .div_ceil(PDF_BYTES_PER_PAGE)
                .saturating_mul(PDF_TOKENS_PER_PAGE),
            DocumentKind::WordProcessor => size
                .saturating_mul(DOCX_TEXT_PERCENT)
                .div_ceil(100 * cpt),
            DocumentKind::Spreadsheet => size
                .saturating_mul(SPREADSHEET_TOKENS_PER_KB)
                .div_ceil(1024),
            DocumentKind::Text => size.div_ceil(cpt),
            DocumentKind::Unknown => size.div_ceil(UNKNOWN_BYTES_PER_TOKEN),
        };
        raw.min(self.max_document_tokens)
    }

    /// File-size estimate for an ingested document.
    pub fn estimate_document(&self, doc: &Document) -> u64 {
        self.estimate_file_tokens(doc.kind, doc.size)
    }
}

// ── Display helpers ─────────────────────────────────────────────────

/// `950 tokens`, `1.2K tokens`.
pub fn format_token_count(tokens: u64) -> String {
    if tokens < 1_000 {
        format!("{tokens} tokens")
    } else {
        format!("{:.1}K tokens", tokens as f64 / 1_000.0)
    }
}

/// `950`, `1.2k`, `3.4M`.
pub fn format_compact_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_estimate_rounds_up() {
        let est = TokenEstimator::default();
        assert_eq!(est.estimate_tokens(""), 0);
        assert_eq!(est.estimate_tokens("abc"), 1);
        assert_eq!(est.estimate_tokens("abcd"), 1);
        assert_eq!(est.estimate_tokens("abcde"), 2);
        assert_eq!(est.estimate_tokens(&"x".repeat(8_000)), 2_000);
    }

    #[test]
    fn multibyte_text_counts_characters() {
        let est = TokenEstimator::default();
        assert_eq!(est.estimate_tokens("ééééé"), 2);
    }

    #[test]
    fn pdf_one_megabyte_is_five_pages() {
        let est = TokenEstimator::default();
        assert_eq!(est.estimate_file_tokens(DocumentKind::Pdf, 1_000_000), 2_500);
    }

    #[test]
    fn file_estimates_by_kind() {
        let est = TokenEstimator::default();
        // 10_000 * 0.3 / 4 = 750
        assert_eq!(est.estimate_file_tokens(DocumentKind::WordProcessor, 10_000), 750);
        // 10 KiB -> 500
        assert_eq!(est.estimate_file_tokens(DocumentKind::Spreadsheet, 10_240), 500);
        assert_eq!(est.estimate_file_tokens(DocumentKind::Text, 4_001), 1_001);
        assert_eq!(est.estimate_file_tokens(DocumentKind::Unknown, 1_000), 100);
        assert_eq!(est.estimate_file_tokens(DocumentKind::Pdf, 0), 0);
    }

    #[test]
    fn file_estimates_are_capped() {
        let est = TokenEstimator::default();
        for kind in [
            DocumentKind::Pdf,
            DocumentKind::WordProcessor,
            DocumentKind::Spreadsheet,
            DocumentKind::Text,
            DocumentKind::Unknown,
        ] {
            assert_eq!(est.estimate_file_tokens(kind, 500_000_000), 3_000, "{kind}");
        }
    }

    #[test]
    fn token_count_formatting() {
        assert_eq!(format_token_count(950), "950 tokens");
        assert_eq!(format_token_count(1_234), "1.2K tokens");
        assert_eq!(format_compact_count(999), "999");
        assert_eq!(format_compact_count(1_240), "1.2k");
        assert_eq!(format_compact_count(3_400_000), "3.4M");
    }
}
