use chrono::Local;
use serde::{Deserialize, Serialize};
use url::Url;

/// Capture-time format written into every document
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One fetched page
///
/// Created once when the page is fetched and never mutated afterwards. The
/// field order matches the on-disk JSON layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlDocument {
    /// Absolute URL, unique within a crawl run
    pub url: String,

    /// Whitespace-collapsed body text
    pub content: String,

    /// Local capture time, informational only
    pub timestamp: String,

    /// The URL path (not the HTML `<title>`)
    pub title: String,

    /// Authority of the crawl's base URL
    pub domain: String,
}

impl CrawlDocument {
    /// Builds a document captured now
    pub fn new(url: &Url, content: String, domain: &str) -> Self {
        Self {
            url: url.to_string(),
            content,
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            title: url.path().to_string(),
            domain: domain.to_string(),
        }
    }
}
