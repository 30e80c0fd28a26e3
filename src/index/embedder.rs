//! Embedding clients
//!
//! The index only needs one thing from an embedder: one fixed-length vector
//! per input text, in input order.

use crate::config::EmbeddingConfig;
use crate::index::EmbedError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Turns text into vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the embedding model, recorded in the index manifest
    fn model(&self) -> &str;

    /// Embeds `texts`, returning exactly one vector per input, in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Embeddings client for OpenAI-compatible `/embeddings` endpoints
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    max_retries: usize,
}

impl OpenAiEmbedder {
    /// Builds a client with an explicit API key
    pub fn new(api_key: &str, config: &EmbeddingConfig) -> Result<Self, EmbedError> {
        if api_key.trim().is_empty() {
            return Err(EmbedError::MissingApiKey(config.api_key_env.clone()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| EmbedError::InvalidApiKey)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Builds a client reading the API key from `config.api_key_env`
    pub fn from_env(config: &EmbeddingConfig) -> Result<Self, EmbedError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| EmbedError::MissingApiKey(config.api_key_env.clone()))?;
        Self::new(&api_key, config)
    }

    fn should_retry(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn is_retryable_error(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_request()
    }

    fn retry_backoff(attempt: usize) -> Duration {
        let capped = attempt.saturating_sub(1).min(5) as u32;
        RETRY_BASE_DELAY * (1 << capped)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut attempt = 0usize;
        loop {
            match self.client.post(&self.endpoint).json(&request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let mut parsed: EmbeddingResponse = response.json().await?;
                        parsed.data.sort_by_key(|entry| entry.index);
                        if parsed.data.len() != texts.len() {
                            return Err(EmbedError::Response(format!(
                                "{} embeddings returned for {} inputs",
                                parsed.data.len(),
                                texts.len()
                            )));
                        }
                        return Ok(parsed
                            .data
                            .into_iter()
                            .map(|entry| entry.embedding)
                            .collect());
                    }

                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if Self::should_retry(status) && attempt < self.max_retries {
                        attempt += 1;
                        tracing::warn!(
                            "Embedding request returned {}, retry {}/{}",
                            status,
                            attempt,
                            self.max_retries
                        );
                        tokio::time::sleep(Self::retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(EmbedError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(err) => {
                    if Self::is_retryable_error(&err) && attempt < self.max_retries {
                        attempt += 1;
                        tracing::warn!(
                            "Embedding request failed ({}), retry {}/{}",
                            err,
                            attempt,
                            self.max_retries
                        );
                        tokio::time::sleep(Self::retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(err.into());
                }
            }
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
