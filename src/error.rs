//! Error types for Newsdesk.

use thiserror::Error;

/// Why a call to the generation service failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationFailure {
    /// Connection or transport problem.
    Transport,
    /// Quota exhausted or rate limited.
    RateLimited,
    /// The HTTP request timed out.
    Timeout,
    /// The service answered, but not with usable text.
    Malformed,
    /// The request itself was rejected (bad model name, bad key, ...).
    Rejected,
}

impl GenerationFailure {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(self) -> bool {
        !matches!(self, GenerationFailure::Rejected)
    }
}

impl std::fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationFailure::Transport => write!(f, "transport"),
            GenerationFailure::RateLimited => write!(f, "rate limited"),
            GenerationFailure::Timeout => write!(f, "timeout"),
            GenerationFailure::Malformed => write!(f, "malformed response"),
            GenerationFailure::Rejected => write!(f, "rejected"),
        }
    }
}

/// Library-level error type for Newsdesk operations.
#[derive(Error, Debug)]
pub enum NewsdeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Intent classification failed: {0}")]
    Classification(#[source] Box<NewsdeskError>),

    #[error("Generation failed ({kind}): {message}")]
    Generation {
        kind: GenerationFailure,
        message: String,
    },

    #[error("Article store error: {0}")]
    Store(String),

    #[error("Scraping error: {0}")]
    Scrape(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl NewsdeskError {
    /// Shorthand for a generation error.
    pub fn generation(kind: GenerationFailure, message: impl Into<String>) -> Self {
        NewsdeskError::Generation {
            kind,
            message: message.into(),
        }
    }

    /// Whether retrying the failed operation makes sense.
    pub fn is_retryable(&self) -> bool {
        match self {
            NewsdeskError::Generation { kind, .. } => kind.is_transient(),
            NewsdeskError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Result type alias for Newsdesk operations.
pub type Result<T> = std::result::Result<T, NewsdeskError>;
