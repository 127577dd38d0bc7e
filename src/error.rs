//! Error types for vidsage.

use thiserror::Error;

/// Library-level error type for vidsage operations.
#[derive(Error, Debug)]
pub enum VidsageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Chat model error: {0}")]
    Chat(String),

    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

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

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

impl VidsageError {
    /// Whether the error was caused by the caller's input rather than a backend.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, VidsageError::InvalidInput(_))
    }
}

/// Result type alias for vidsage operations.
pub type Result<T> = std::result::Result<T, VidsageError>;
