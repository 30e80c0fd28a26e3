//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building the HTTP client with a declared user agent and bounded timeouts
//! - GET requests for page content
//! - Error classification (timeout, network, non-2xx status)
//! - Filtering extracted links down to unvisited same-site URLs

use crate::config::UserAgentConfig;
use crate::crawler::parser::parse_html;
use crate::url::is_same_site;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9";

/// Upper bound on establishing a connection, independent of the request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors for a single page fetch
///
/// The crawler logs these and moves on to the next URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Normalized body text
    pub content: String,

    /// Same-site links not yet visited when the page was parsed
    pub links: Vec<String>,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total time allowed for one request
///
/// # Example
///
/// ```no_run
/// use harvest_index::config::UserAgentConfig;
/// use harvest_index::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "HarvestIndex".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

    Client::builder()
        .user_agent(config.header_value())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(CONNECT_TIMEOUT))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches single pages of one site
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    domain: String,
}

impl PageFetcher {
    /// Creates a fetcher whose links are scoped to `domain` (a site authority)
    pub fn new(client: Client, domain: &str) -> Self {
        Self {
            client,
            domain: domain.to_string(),
        }
    }

    /// Fetches `url` and extracts its text and outbound links
    ///
    /// # Request Flow
    ///
    /// 1. Send one GET (redirects followed by the client)
    /// 2. Any non-2xx status is an error
    /// 3. Parse the body, resolving links against the final page URL
    /// 4. Keep links on this fetcher's site that are not in `visited`
    pub async fn fetch(
        &self,
        url: &str,
        visited: &HashSet<String>,
    ) -> Result<FetchedPage, FetchError> {
        let request_url = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let response = self
            .client
            .get(request_url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let page_url = response.url().clone();
        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        let parsed = parse_html(&body, &page_url);
        let total_links = parsed.links.len();

        let links: Vec<String> = parsed
            .links
            .into_iter()
            .filter(|link| is_same_site(link, &self.domain))
            .map(|link| link.to_string())
            .filter(|link| !visited.contains(link))
            .collect();

        tracing::debug!(
            "{}: {} chars, {} of {} links kept",
            url,
            parsed.content.len(),
            links.len(),
            total_links
        );

        Ok(FetchedPage {
            content: parsed.content,
            links,
        })
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
