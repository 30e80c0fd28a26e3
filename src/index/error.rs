//! Error types for the index module

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, opening or querying the index
#[derive(Debug, Error)]
pub enum IndexError {
    /// An existing index could not be read; `initialize` recovers from this
    /// by deleting the directory and rebuilding
    #[error("Failed to open index at {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    /// Nothing to index; fatal for a rebuild
    #[error("No content to index: {0}")]
    NoContent(String),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("Filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid chunking parameters: {0}")]
    Chunking(String),

    #[error("Query vector has {actual} dimensions, index has {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors from the embedding client
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("Missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("API key is not a valid header value")]
    InvalidApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding request failed ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Malformed embedding response: {0}")]
    Response(String),
}
