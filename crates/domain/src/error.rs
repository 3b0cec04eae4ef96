use std::fmt;

/// Shared error type used across all reportwright crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    // ── Input / validation ─────────────────────────────────────────
    #[error("no API key configured")]
    MissingCredential,

    #[error("invalid API key: {0}")]
    InvalidCredential(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported file type: {name} (.{extension})")]
    UnsupportedFileType { name: String, extension: String },

    #[error("file {name} is too large ({size} bytes, limit {limit} bytes)")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    // ── Budget ─────────────────────────────────────────────────────
    #[error("budget exceeded: limit ${limit_usd:.2}, used ${used_usd:.4}")]
    BudgetExceeded { limit_usd: f64, used_usd: f64 },

    // ── Provider / network ─────────────────────────────────────────
    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty response from provider")]
    EmptyResponse,

    // ── Document parsing ───────────────────────────────────────────
    #[error("failed to process {name}: {message}")]
    Parse { name: String, message: String },

    // ── Misc ───────────────────────────────────────────────────────
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("cancelled")]
    Cancelled,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used to tell the user what to do
/// about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad credential, bad section definition, bad file.
    Input,
    /// Session spend ceiling reached.
    Budget,
    /// Network trouble, timeouts, rate limits, provider 5xx.
    Transient,
    /// The provider refused the request or returned something unusable.
    Rejected,
    /// A document could not be read.
    Parse,
    Internal,
}

impl ErrorKind {
    /// Short, user-facing advice for this class of failure.
    pub fn hint(self) -> &'static str {
        match self {
            Self::Input => "fix your input",
            Self::Budget => "raise your budget or stop",
            Self::Transient => "retry, the provider had a transient issue",
            Self::Rejected => "the provider rejected this content",
            Self::Parse => "the document could not be read",
            Self::Internal => "internal error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::Budget => "budget",
            Self::Transient => "transient",
            Self::Rejected => "rejected",
            Self::Parse => "parse",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential
            | Self::InvalidCredential(_)
            | Self::InvalidInput(_)
            | Self::UnsupportedFileType { .. }
            | Self::FileTooLarge { .. }
            | Self::Config(_) => ErrorKind::Input,
            Self::BudgetExceeded { .. } => ErrorKind::Budget,
            Self::Http(_) | Self::Timeout(_) => ErrorKind::Transient,
            Self::Provider { status, .. } => match status {
                Some(408 | 429) => ErrorKind::Transient,
                Some(s) if *s >= 500 => ErrorKind::Transient,
                None => ErrorKind::Transient,
                Some(_) => ErrorKind::Rejected,
            },
            Self::Json(_) | Self::EmptyResponse => ErrorKind::Rejected,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Io(_)
            | Self::Cancelled
            | Self::NotFound(_)
            | Self::InvalidState(_)
            | Self::Other(_) => ErrorKind::Internal,
        }
    }
}
