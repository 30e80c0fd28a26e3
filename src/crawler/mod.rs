//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a declared identity and bounded timeouts
//! - HTML text and link extraction
//! - The breadth-first frontier and visited set
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{run_crawl, CrawlStats, Crawler};
pub use fetcher::{build_http_client, FetchError, FetchedPage, PageFetcher};
pub use frontier::Frontier;
pub use parser::{collapse_whitespace, parse_html, ParsedPage};
