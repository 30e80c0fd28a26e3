//! Storage traits and error types
//!
//! This module defines the trait interface for crawl output backends and
//! associated error types.

use crate::storage::CrawlDocument;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting crawl output
///
/// All of these are fatal for a crawl: a run that cannot persist its
/// findings stops instead of continuing in memory.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for crawl output backends
pub trait DocumentStore {
    /// Persists one document
    ///
    /// # Arguments
    ///
    /// * `position` - 1-based position of the document among successful fetches
    /// * `document` - The fetched document
    fn save_document(&mut self, position: usize, document: &CrawlDocument) -> StorageResult<()>;

    /// Persists the ordered documents of a whole run
    fn save_snapshot(&mut self, documents: &[CrawlDocument]) -> StorageResult<()>;
}
