//! Robots.txt parser implementation
//!
//! This module provides functionality for matching URLs against robots.txt
//! content using the robotstxt crate.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Parsed robots.txt data
///
/// This is a wrapper around the robotstxt crate's matcher, providing a
/// simplified interface for checking if URLs are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRobots {
    policy: Policy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Policy {
    AllowAll,
    DisallowAll,
    Rules(String),
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            policy: Policy::Rules(content.to_string()),
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used when robots.txt is absent or cannot be loaded.
    pub fn allow_all() -> Self {
        Self {
            policy: Policy::AllowAll,
        }
    }

    /// Creates a ParsedRobots that denies everything
    ///
    /// Used when the server refuses access to robots.txt itself (401/403).
    pub fn disallow_all() -> Self {
        Self {
            policy: Policy::DisallowAll,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The robots.txt product token
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match &self.policy {
            Policy::AllowAll => true,
            Policy::DisallowAll => false,
            Policy::Rules(content) if content.trim().is_empty() => true,
            Policy::Rules(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, user_agent, url)
            }
        }
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// A group naming the agent wins over the wildcard group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        let Policy::Rules(content) = &self.policy else {
            return None;
        };

        let mut current_user_agents: Vec<String> = Vec::new();
        let mut in_group_body = false;
        let mut crawl_delay_for_wildcard: Option<f64> = None;
        let mut crawl_delay_for_agent: Option<f64> = None;

        let normalized_agent = user_agent.to_lowercase();

        for line in content.lines() {
            let trimmed = line.split('#').next().unwrap_or("").trim();
            if trimmed.is_empty() {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // Consecutive User-agent lines share one group
                    if in_group_body {
                        current_user_agents.clear();
                        in_group_body = false;
                    }
                    current_user_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_group_body = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if current_user_agents.iter().any(|ua| ua == &normalized_agent) {
                        crawl_delay_for_agent = Some(delay);
                    } else if current_user_agents.iter().any(|ua| ua == "*") {
                        crawl_delay_for_wildcard = Some(delay);
                    }
                }
                _ => in_group_body = true,
            }
        }

        crawl_delay_for_agent
            .or(crawl_delay_for_wildcard)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}
