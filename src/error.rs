//! Error types for Playbook.

use thiserror::Error;

/// Library-level error type for Playbook operations.
#[derive(Error, Debug)]
pub enum PlaybookError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript source error: {0}")]
    TranscriptSource(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Chunking failed: {0}")]
    Chunking(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

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

    #[error("Transcript not found: {0}")]
    TranscriptNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Playbook operations.
pub type Result<T> = std::result::Result<T, PlaybookError>;
