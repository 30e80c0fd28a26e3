//! Harvest-Index: a polite single-site crawler feeding a retrieval index
//!
//! This crate crawls one website while respecting robots.txt and a fixed rate
//! limit, persists every fetched page as a JSON document, and turns those
//! documents into an embedded, on-disk vector index for retrieval.

pub mod config;
pub mod crawler;
pub mod index;
pub mod robots;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Harvest-Index operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),

    #[error("Embedding error: {0}")]
    Embed(#[from] index::EmbedError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Base URL has no host: {0}")]
    MissingDomain(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Harvest-Index operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Crawler};
pub use index::{IndexStore, ScoredChunk, VectorIndex};
pub use storage::CrawlDocument;
