//! One-shot robots.txt gate for a single-site crawl

use crate::robots::ParsedRobots;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while loading robots.txt
///
/// These never abort a crawl: [`RobotsGate::load`] logs them and falls back
/// to a permissive policy.
#[derive(Debug, Error)]
pub enum PolicyLoadError {
    #[error("Invalid robots.txt URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to fetch robots.txt: {0}")]
    Http(#[from] reqwest::Error),

    #[error("robots.txt at {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Answers "may I fetch URL X?" for one agent on one site
///
/// The policy document is fetched exactly once, at construction. No
/// re-fetching happens during the run.
#[derive(Debug, Clone)]
pub struct RobotsGate {
    robots: ParsedRobots,
    agent: String,
}

impl RobotsGate {
    /// Loads `<base_url>/robots.txt` and builds a gate for `agent`
    ///
    /// # Status handling
    ///
    /// | Response | Policy |
    /// |----------|--------|
    /// | 2xx | Parse the body |
    /// | 401 / 403 | Disallow everything |
    /// | Other 4xx | Allow everything (no robots.txt) |
    /// | 5xx, network error, timeout | Log the error, allow everything |
    pub async fn load(client: &Client, base_url: &Url, agent: &str) -> Self {
        let robots = match fetch_policy(client, base_url).await {
            Ok(robots) => robots,
            Err(e) => {
                tracing::error!("Error reading robots.txt: {}", e);
                ParsedRobots::allow_all()
            }
        };

        Self::new(robots, agent)
    }

    /// Builds a gate from an already parsed policy
    pub fn new(robots: ParsedRobots, agent: &str) -> Self {
        Self {
            robots,
            agent: agent.to_string(),
        }
    }

    /// Returns true if the agent may fetch `url`
    pub fn is_allowed(&self, url: &str) -> bool {
        self.robots.is_allowed(url, &self.agent)
    }

    /// Crawl-delay declared for this agent, if any
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.robots.crawl_delay(&self.agent)
    }

    /// The robots.txt product token this gate answers for
    pub fn agent(&self) -> &str {
        &self.agent
    }
}

async fn fetch_policy(client: &Client, base_url: &Url) -> Result<ParsedRobots, PolicyLoadError> {
    let robots_url = base_url.join("/robots.txt")?;
    tracing::debug!("Fetching robots.txt from {}", robots_url);

    let response = client.get(robots_url.clone()).send().await?;
    let status = response.status();

    if status.is_success() {
        let body = response.text().await?;
        return Ok(ParsedRobots::from_content(&body));
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracing::warn!(
            "robots.txt at {} returned HTTP {}, treating the site as disallowed",
            robots_url,
            status.as_u16()
        );
        return Ok(ParsedRobots::disallow_all());
    }

    if status.is_client_error() {
        tracing::info!("No robots.txt at {} (HTTP {})", robots_url, status.as_u16());
        return Ok(ParsedRobots::allow_all());
    }

    Err(PolicyLoadError::Status {
        url: robots_url.to_string(),
        status: status.as_u16(),
    })
}
