//! Error types for Worktrack

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// API error
    #[error("API error: {0}")]
    Api(String),

    /// Categorization error (contained inside the categorizer, never surfaced to clients)
    #[error("Categorization error: {0}")]
    Categorize(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        CoreError::Categorize(e.to_string())
    }
}

/// Caller-facing failures of the session engine.
///
/// All variants are recoverable; the HTTP layer maps each one to a status code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Task name was empty or whitespace only
    #[error("{0}")]
    InvalidInput(String),

    /// No session with the given identifier
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Operation not permitted from the session's current status
    #[error("{0}")]
    InvalidTransition(String),
}

impl SessionError {
    /// Stable machine-readable kind, used in error response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::InvalidInput(_) => "invalid_input",
            SessionError::NotFound(_) => "not_found",
            SessionError::InvalidTransition(_) => "invalid_transition",
        }
    }
}

/// Result type alias for session engine operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;
