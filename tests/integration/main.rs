//! Integration tests for Harvest-Index
//!
//! Crawl tests drive the full crawl loop against wiremock servers; index
//! tests drive the build/reuse lifecycle with an in-process embedder.

mod crawl_tests;
mod index_tests;
