//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates:
//! - The breadth-first frontier and visited set
//! - robots.txt checks and page fetching
//! - Per-page persistence and the final snapshot
//! - The fixed post-fetch delay

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, PageFetcher};
use crate::crawler::frontier::Frontier;
use crate::robots::RobotsGate;
use crate::storage::{CrawlDocument, DocumentStore, JsonDirStore};
use crate::url::site_authority;
use crate::{HarvestError, Result};
use std::time::{Duration, Instant};
use url::Url;

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Pages fetched and persisted
    pub fetched: usize,
    /// URLs rejected by robots.txt
    pub denied: usize,
    /// URLs whose fetch failed
    pub failed: usize,
    /// Queue entries dropped because the URL was already handled
    pub duplicates_skipped: usize,
}

/// Single-site, single-threaded crawler
///
/// One fetch is in flight at a time; the fixed delay after each successful
/// fetch is the crawler's only rate and concurrency limit. The frontier and
/// visited set live only inside [`Crawler::crawl`], so every call starts
/// fresh.
pub struct Crawler<S: DocumentStore = JsonDirStore> {
    base_url: Url,
    domain: String,
    fetcher: PageFetcher,
    robots: RobotsGate,
    store: S,
    delay: Duration,
    max_pages: usize,
    last_stats: CrawlStats,
}

impl Crawler<JsonDirStore> {
    /// Creates a crawler writing into the configured output directory
    ///
    /// Fails if the output directory cannot be created.
    pub async fn new(config: &Config) -> Result<Self> {
        let store = JsonDirStore::open(&config.output.directory)?;
        Self::with_store(config, store).await
    }
}

impl<S: DocumentStore> Crawler<S> {
    /// Creates a crawler persisting through `store`
    ///
    /// This builds the HTTP client and loads robots.txt once. A robots.txt
    /// that cannot be loaded is logged and treated as permissive.
    pub async fn with_store(config: &Config, store: S) -> Result<Self> {
        let base_url = Url::parse(&config.crawler.base_url)?;
        let domain = site_authority(&base_url)
            .ok_or_else(|| HarvestError::MissingDomain(config.crawler.base_url.clone()))?;

        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        let robots =
            RobotsGate::load(&client, &base_url, config.user_agent.robots_token()).await;

        let mut delay = config.crawler.rate_limit();
        if config.crawler.respect_crawl_delay {
            if let Some(mut crawl_delay) = robots.crawl_delay() {
                let max_crawl_delay = config.crawler.max_crawl_delay();
                if crawl_delay > max_crawl_delay {
                    tracing::warn!(
                        "robots.txt crawl delay of {:?} exceeds the {:?} maximum, clamping",
                        crawl_delay,
                        max_crawl_delay
                    );
                    crawl_delay = max_crawl_delay;
                }
                if crawl_delay > delay {
                    tracing::info!(
                        "robots.txt asks for a {:?} crawl delay, using it instead of {:?}",
                        crawl_delay,
                        delay
                    );
                    delay = crawl_delay;
                }
            }
        }

        Ok(Self {
            base_url,
            fetcher: PageFetcher::new(client, &domain),
            domain,
            robots,
            store,
            delay,
            max_pages: config.crawler.max_pages,
            last_stats: CrawlStats::default(),
        })
    }

    /// Authority shared by every document of this crawler
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The fixed delay applied after each successful fetch
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Configured page limit
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Counters of the most recent run
    pub fn last_stats(&self) -> CrawlStats {
        self.last_stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Crawls with the configured page limit
    pub async fn run(&mut self) -> Result<Vec<CrawlDocument>> {
        self.crawl(self.max_pages).await
    }

    /// Runs one breadth-first crawl from the base URL
    ///
    /// # Loop
    ///
    /// Until the frontier is empty or `max_pages` documents were collected:
    /// 1. Dequeue the next URL; drop it if already visited
    /// 2. If robots.txt denies it, mark it visited and move on (not counted)
    /// 3. Fetch; on failure log, mark visited and move on
    /// 4. On success persist `doc_<n>.json`, mark visited, enqueue the
    ///    page's new links and sleep for the fixed delay
    ///
    /// The ordered documents are then written as one snapshot and returned.
    /// Only storage failures abort the run.
    pub async fn crawl(&mut self, max_pages: usize) -> Result<Vec<CrawlDocument>> {
        let start_time = Instant::now();
        let mut frontier = Frontier::new(self.base_url.as_str());
        let mut documents: Vec<CrawlDocument> = Vec::new();
        let mut stats = CrawlStats::default();

        tracing::info!(
            "Starting crawl of {} (max {} pages, {:?} delay)",
            self.base_url,
            max_pages,
            self.delay
        );

        while documents.len() < max_pages {
            let Some(url) = frontier.next_unvisited() else {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            };

            if !self.robots.is_allowed(&url) {
                tracing::warn!("Scraping not allowed for: {}", url);
                frontier.mark_visited(&url);
                stats.denied += 1;
                continue;
            }

            tracing::info!("Scraping: {}", url);
            let page = match self.fetcher.fetch(&url, frontier.visited()).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!("Error scraping {}: {}", url, e);
                    frontier.mark_visited(&url);
                    stats.failed += 1;
                    continue;
                }
            };

            // The frontier only ever holds URLs that already parsed
            let page_url = Url::parse(&url)?;
            let document = CrawlDocument::new(&page_url, page.content, &self.domain);
            self.store.save_document(documents.len() + 1, &document)?;
            documents.push(document);

            frontier.mark_visited(&url);
            frontier.extend(page.links);
            stats.fetched += 1;

            if documents.len() < max_pages {
                tokio::time::sleep(self.delay).await;
            }
        }

        self.store.save_snapshot(&documents)?;

        stats.duplicates_skipped = frontier.duplicates_skipped();
        self.last_stats = stats;

        tracing::info!(
            "Crawl completed: {} pages fetched, {} denied by robots.txt, {} failed, {} duplicates skipped, {} still queued, in {:?}",
            stats.fetched,
            stats.denied,
            stats.failed,
            stats.duplicates_skipped,
            frontier.pending(),
            start_time.elapsed()
        );

        Ok(documents)
    }
}

/// Runs a complete crawl operation
///
/// # Example
///
/// ```no_run
/// use harvest_index::config::load_config;
/// use harvest_index::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let documents = run_crawl(&config).await?;
/// println!("Successfully scraped {} pages", documents.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config) -> Result<Vec<CrawlDocument>> {
    let mut crawler = Crawler::new(config).await?;
    crawler.run().await
}
