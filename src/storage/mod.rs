//! Storage module for persisting crawl output
//!
//! This module handles writing crawl results to disk:
//! - One `doc_<n>.json` file per fetched page, written as soon as it is fetched
//! - A `full_dataset.json` snapshot of the whole run, written at the end

mod document;
mod json;
mod traits;

pub use document::{CrawlDocument, TIMESTAMP_FORMAT};
pub use json::{JsonDirStore, SNAPSHOT_FILE};
pub use traits::{DocumentStore, StorageError, StorageResult};
