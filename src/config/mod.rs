//! Configuration module for Harvest-Index
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use harvest_index::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling {} (max {} pages)", config.crawler.base_url, config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, EmbeddingConfig, IndexConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
