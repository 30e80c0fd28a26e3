//! Harvest-Index main entry point
//!
//! Command-line interface for crawling a site and building or querying the
//! retrieval index over the crawled documents.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harvest_index::config::{load_config, Config};
use harvest_index::crawler::Crawler;
use harvest_index::index::{IndexStore, OpenAiEmbedder};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log file written next to the crawl output
const LOG_FILE: &str = "scraping.log";

/// Harvest-Index: a polite single-site crawler feeding a retrieval index
///
/// `crawl` collects pages from one site into JSON documents, `index` embeds
/// those documents into a persisted vector index, and `query` retrieves the
/// chunks closest to a question.
#[derive(Parser, Debug)]
#[command(name = "harvest-index")]
#[command(version)]
#[command(about = "A polite single-site crawler feeding a retrieval index", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, value_name = "CONFIG", default_value = "harvest.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the configured site into the output directory
    Crawl {
        /// Override the configured page limit
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Build the vector index, or reuse the persisted one
    Index {
        /// Discard any persisted index and rebuild it
        #[arg(long)]
        rebuild: bool,
    },

    /// Retrieve the chunks most similar to TEXT
    Query {
        /// Query text
        text: String,

        /// Number of chunks to return (defaults to the configured top-k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Discard any persisted index and rebuild it first
        #[arg(long)]
        rebuild: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config is needed before logging to know where the crawl log goes
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    let log_dir = match cli.command {
        Command::Crawl { .. } => {
            std::fs::create_dir_all(&config.output.directory).with_context(|| {
                format!(
                    "Failed to create output directory {}",
                    config.output.directory.display()
                )
            })?;
            Some(config.output.directory.as_path())
        }
        _ => None,
    };
    let _guard = setup_logging(cli.verbose, cli.quiet, log_dir)?;

    tracing::info!("Configuration loaded from {}", cli.config.display());

    match cli.command {
        Command::Crawl { max_pages } => handle_crawl(&config, max_pages).await,
        Command::Index { rebuild } => handle_index(&config, rebuild).await,
        Command::Query { text, k, rebuild } => handle_query(&config, &text, k, rebuild).await,
    }
}

/// Sets up the tracing subscriber; the returned guard flushes the log file
fn setup_logging(verbose: u8, quiet: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("harvest_index=info,warn"),
            1 => EnvFilter::new("harvest_index=debug,info"),
            2 => EnvFilter::new("harvest_index=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(LOG_FILE)
                .build(dir)
                .with_context(|| format!("Failed to open {} in {}", LOG_FILE, dir.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn handle_crawl(config: &Config, max_pages: Option<usize>) -> Result<()> {
    let mut crawler = Crawler::new(config)
        .await
        .context("Failed to set up crawler")?;
    let limit = max_pages.unwrap_or(crawler.max_pages());

    let documents = crawler.crawl(limit).await.context("Crawl failed")?;
    let stats = crawler.last_stats();

    println!(
        "Successfully scraped {} pages from {}",
        documents.len(),
        crawler.domain()
    );
    println!(
        "  {} denied by robots.txt, {} failed, {} duplicates skipped",
        stats.denied, stats.failed, stats.duplicates_skipped
    );
    println!("  Output: {}", config.output.directory.display());
    Ok(())
}

fn index_store(config: &Config, rebuild: bool) -> Result<IndexStore<OpenAiEmbedder>> {
    let embedder = OpenAiEmbedder::from_env(&config.embedding)
        .context("Failed to set up embedding client")?;
    let store = IndexStore::new(config, embedder)?;
    Ok(if rebuild {
        store.with_force_rebuild(true)
    } else {
        store
    })
}

async fn handle_index(config: &Config, rebuild: bool) -> Result<()> {
    let store = index_store(config, rebuild)?;
    let index = store
        .initialize()
        .await
        .context("Failed to initialize vector store")?;

    println!(
        "Vector index ready: {} chunks, {} dimensions ({})",
        index.len(),
        index.manifest().dimension,
        index.manifest().model
    );
    println!("  Location: {}", store.persist_path().display());
    Ok(())
}

async fn handle_query(config: &Config, text: &str, k: Option<usize>, rebuild: bool) -> Result<()> {
    let store = index_store(config, rebuild)?;
    let index = store
        .initialize()
        .await
        .context("Failed to initialize vector store")?;

    let k = k.unwrap_or(config.index.top_k);
    let results = store.query(&index, text, k).await.context("Query failed")?;

    if results.is_empty() {
        println!("No matching chunks");
        return Ok(());
    }
    for (rank, chunk) in results.iter().enumerate() {
        println!("=== #{} (score {:.4}) ===", rank + 1, chunk.score);
        println!("{}\n", chunk.text);
    }
    Ok(())
}
