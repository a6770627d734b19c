//! Error types for the question-answering pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Corpus files unreadable or malformed
    #[error("data load error: {0}")]
    DataLoad(String),

    /// Bad or missing configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Index build or persistence failed
    #[error("index build error: {0}")]
    IndexBuild(String),

    /// Generative call failed; recoverable through the keyword fallback
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Empty or otherwise invalid question input
    #[error("validation error: {0}")]
    Validation(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a data load error
    pub fn data_load(message: impl Into<String>) -> Self {
        Self::DataLoad(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an index build error
    pub fn index_build(message: impl Into<String>) -> Self {
        Self::IndexBuild(message.into())
    }

    /// Create a synthesis error
    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis(message.into())
    }
}
