use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Harvest-Index
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Site root; the crawl starts here and never leaves its host
    pub base_url: String,

    /// Maximum number of documents collected in one run
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Fixed delay after every successful fetch (milliseconds)
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Upper bound on a single HTTP request (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Use robots.txt Crawl-delay when it is longer than the rate limit
    #[serde(default = "default_true")]
    pub respect_crawl_delay: bool,

    /// Upper bound on an honored robots.txt Crawl-delay (seconds)
    #[serde(default = "default_max_crawl_delay_secs")]
    pub max_crawl_delay_secs: u64,
}

impl CrawlerConfig {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn max_crawl_delay(&self) -> Duration {
        Duration::from_secs(self.max_crawl_delay_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt agent token
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; respects robots.txt)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; respects robots.txt)",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }

    /// The product token matched against robots.txt `User-agent` groups
    pub fn robots_token(&self) -> &str {
        &self.crawler_name
    }
}

/// Crawl output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving doc_<n>.json, full_dataset.json and scraping.log
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexConfig {
    /// Directory holding the persisted index; its existence means "reuse"
    #[serde(default = "default_persist_path")]
    pub persist_path: PathBuf,

    /// Directories scanned (non-recursively) for crawl documents
    #[serde(default = "default_source_directories")]
    pub source_directories: Vec<PathBuf>,

    /// Chunk window size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Discard an existing index and rebuild from the sources
    #[serde(default)]
    pub force_rebuild: bool,

    /// Default number of chunks returned by a query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            persist_path: default_persist_path(),
            source_directories: default_source_directories(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            force_rebuild: false,
            top_k: default_top_k(),
        }
    }
}

/// Hosted embedding API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EmbeddingConfig {
    /// OpenAI-compatible API root; `/embeddings` is appended
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Maximum number of chunks sent per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_max_pages() -> usize {
    100
}

fn default_rate_limit_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_max_crawl_delay_secs() -> u64 {
    60
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("scraped_documents")
}

fn default_persist_path() -> PathBuf {
    PathBuf::from("vector_index")
}

fn default_source_directories() -> Vec<PathBuf> {
    vec![default_output_directory()]
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    4
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_batch_size() -> usize {
    64
}

fn default_max_retries() -> usize {
    3
}

fn default_embedding_timeout_secs() -> u64 {
    60
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
