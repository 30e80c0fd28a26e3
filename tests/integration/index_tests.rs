//! Integration tests for the vector index lifecycle
//!
//! A counting in-process embedder makes "reused" versus "rebuilt"
//! observable without any network access.

use async_trait::async_trait;
use harvest_index::config::{parse_config, Config};
use harvest_index::index::{EmbedError, Embedder, IndexError, IndexStore, INDEX_FILE};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Deterministic embedder counting how many texts it embedded
#[derive(Clone)]
struct CountingEmbedder {
    model: String,
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingEmbedder {
    fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("counting")
        }
    }

    fn embedded(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Letter histogram over a, e, i, o, u plus a constant bias
fn letter_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut vector: Vec<f32> = ['a', 'e', 'i', 'o', 'u']
        .iter()
        .map(|v| lower.chars().filter(|c| c == v).count() as f32)
        .collect();
    vector.push(1.0);
    vector
}

#[async_trait]
impl Embedder for CountingEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if self.fail {
            return Err(EmbedError::Status {
                status: 500,
                body: "unavailable".to_string(),
            });
        }
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| letter_vector(t)).collect())
    }
}

struct Fixture {
    _tmp: TempDir,
    docs: PathBuf,
    persist: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let docs = tmp.path().join("scraped_documents");
        std::fs::create_dir_all(&docs).unwrap();
        let persist = tmp.path().join("vector_index");
        Self {
            _tmp: tmp,
            docs,
            persist,
        }
    }

    fn write_doc(&self, n: usize, url: &str, content: &str) {
        let document = serde_json::json!({
            "url": url,
            "content": content,
            "timestamp": "2024-01-01 00:00:00",
            "title": "/",
            "domain": "example.com",
        });
        std::fs::write(
            self.docs.join(format!("doc_{}.json", n)),
            serde_json::to_string_pretty(&document).unwrap(),
        )
        .unwrap();
    }

    fn config(&self) -> Config {
        parse_config(&format!(
            r#"
[crawler]
base-url = "https://example.com"

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"

[index]
persist-path = "{}"
source-directories = ["{}"]
chunk-size = 80
chunk-overlap = 20

[embedding]
batch-size = 2
"#,
            self.persist.display(),
            self.docs.display()
        ))
        .expect("Failed to parse test config")
    }

    fn store(&self, embedder: CountingEmbedder) -> IndexStore<CountingEmbedder> {
        IndexStore::new(&self.config(), embedder).expect("Failed to create index store")
    }

    fn with_documents() -> Self {
        let fixture = Self::new();
        fixture.write_doc(1, "https://example.com/", "Welcome to the example site about gardening.");
        fixture.write_doc(
            2,
            "https://example.com/tools",
            "Useful tools include a spade, a hoe and a watering can for every garden.",
        );
        fixture.write_doc(3, "https://example.com/zzz", "Rhythm myths: crypt, gym, lynx.");
        fixture
    }
}

fn staging_dir(persist: &Path) -> PathBuf {
    persist.with_file_name("vector_index.building")
}

#[tokio::test]
async fn test_build_then_reuse_without_embedding() {
    let fixture = Fixture::with_documents();

    let embedder = CountingEmbedder::new("counting");
    let store = fixture.store(embedder.clone());
    let built = store.initialize().await.expect("Build failed");

    assert!(!built.is_empty());
    assert_eq!(embedder.embedded(), built.len());
    assert!(fixture.persist.join(INDEX_FILE).is_file());
    assert!(!staging_dir(&fixture.persist).exists());

    // A second store over the same directory reuses it
    let second = CountingEmbedder::new("counting");
    let reopened = fixture
        .store(second.clone())
        .initialize()
        .await
        .expect("Reuse failed");

    assert_eq!(second.embedded(), 0);
    assert_eq!(reopened, built);
}

#[tokio::test]
async fn test_chunks_keep_rendered_document_shape() {
    let fixture = Fixture::with_documents();
    let index = fixture
        .store(CountingEmbedder::new("counting"))
        .initialize()
        .await
        .unwrap();

    let first = &index.records()[0];
    assert!(first
        .text
        .starts_with("URL: https://example.com/\nTitle: /\nContent: Welcome"));
    assert!(index.records().iter().all(|r| r.text.chars().count() <= 80));
    assert_eq!(index.manifest().chunk_size, 80);
    assert_eq!(index.manifest().chunk_overlap, 20);
    assert_eq!(index.manifest().dimension, 6);
}

#[tokio::test]
async fn test_deleted_directory_triggers_rebuild() {
    let fixture = Fixture::with_documents();
    fixture
        .store(CountingEmbedder::new("counting"))
        .initialize()
        .await
        .unwrap();

    std::fs::remove_dir_all(&fixture.persist).unwrap();
    fixture.write_doc(4, "https://example.com/new", "A brand new page appeared.");

    let embedder = CountingEmbedder::new("counting");
    let rebuilt = fixture.store(embedder.clone()).initialize().await.unwrap();

    assert!(embedder.embedded() > 0);
    assert!(rebuilt
        .records()
        .iter()
        .any(|r| r.text.contains("https://example.com/new")));
}

#[tokio::test]
async fn test_new_documents_ignored_while_index_exists() {
    let fixture = Fixture::with_documents();
    let built = fixture
        .store(CountingEmbedder::new("counting"))
        .initialize()
        .await
        .unwrap();

    fixture.write_doc(4, "https://example.com/new", "A brand new page appeared.");
    let reused = fixture
        .store(CountingEmbedder::new("counting"))
        .initialize()
        .await
        .unwrap();

    assert_eq!(reused, built);
}

#[tokio::test]
async fn test_empty_sources_is_no_content() {
    let fixture = Fixture::new();
    let result = fixture
        .store(CountingEmbedder::new("counting"))
        .initialize()
        .await;

    assert!(matches!(result, Err(IndexError::NoContent(_))));
    assert!(!fixture.persist.exists());
}

#[tokio::test]
async fn test_missing_source_directory_is_no_content() {
    let fixture = Fixture::new();
    std::fs::remove_dir_all(&fixture.docs).unwrap();

    let result = fixture
        .store(CountingEmbedder::new("counting"))
        .initialize()
        .await;

    assert!(matches!(result, Err(IndexError::NoContent(_))));
}

#[tokio::test]
async fn test_corrupt_index_is_rebuilt() {
    let fixture = Fixture::with_documents();
    std::fs::create_dir_all(&fixture.persist).unwrap();
    std::fs::write(fixture.persist.join(INDEX_FILE), "{ truncated").unwrap();

    let embedder = CountingEmbedder::new("counting");
    let index = fixture.store(embedder.clone()).initialize().await.unwrap();

    assert!(!index.is_empty());
    assert!(embedder.embedded() > 0);
    assert_eq!(
        fixture.store(CountingEmbedder::new("counting")).open().unwrap(),
        index
    );
}

#[tokio::test]
async fn test_empty_directory_is_rebuilt() {
    let fixture = Fixture::with_documents();
    std::fs::create_dir_all(&fixture.persist).unwrap();

    let embedder = CountingEmbedder::new("counting");
    let index = fixture.store(embedder.clone()).initialize().await.unwrap();

    assert_eq!(embedder.embedded(), index.len());
}

#[tokio::test]
async fn test_model_change_triggers_rebuild() {
    let fixture = Fixture::with_documents();
    fixture
        .store(CountingEmbedder::new("model-a"))
        .initialize()
        .await
        .unwrap();

    let embedder = CountingEmbedder::new("model-b");
    let index = fixture.store(embedder.clone()).initialize().await.unwrap();

    assert!(embedder.embedded() > 0);
    assert_eq!(index.manifest().model, "model-b");
}

#[tokio::test]
async fn test_force_rebuild() {
    let fixture = Fixture::with_documents();
    fixture
        .store(CountingEmbedder::new("counting"))
        .initialize()
        .await
        .unwrap();

    let embedder = CountingEmbedder::new("counting");
    let index = fixture
        .store(embedder.clone())
        .with_force_rebuild(true)
        .initialize()
        .await
        .unwrap();

    assert_eq!(embedder.embedded(), index.len());
}

#[tokio::test]
async fn test_failed_force_rebuild_keeps_previous_index() {
    let fixture = Fixture::with_documents();
    let built = fixture
        .store(CountingEmbedder::new("counting"))
        .initialize()
        .await
        .unwrap();

    let result = fixture
        .store(CountingEmbedder::failing())
        .with_force_rebuild(true)
        .initialize()
        .await;

    assert!(matches!(result, Err(IndexError::Embedding(_))));
    assert!(!staging_dir(&fixture.persist).exists());
    let kept = fixture
        .store(CountingEmbedder::new("counting"))
        .open()
        .expect("Previous index should survive");
    assert_eq!(kept, built);
}

#[tokio::test]
async fn test_failed_build_leaves_nothing_behind() {
    let fixture = Fixture::with_documents();
    let result = fixture.store(CountingEmbedder::failing()).initialize().await;

    assert!(matches!(
        result,
        Err(IndexError::Embedding(EmbedError::Status { status: 500, .. }))
    ));
    assert!(!fixture.persist.exists());
    assert!(!staging_dir(&fixture.persist).exists());
}

#[tokio::test]
async fn test_query_ranks_closest_chunk_first() {
    let fixture = Fixture::new();
    fixture.write_doc(1, "https://example.com/a", "aaaa aaaa aaaa");
    fixture.write_doc(2, "https://example.com/b", "ooooo uuuuu ooooo");

    let store = fixture.store(CountingEmbedder::new("counting"));
    let index = store.initialize().await.unwrap();
    let results = store.query(&index, "aaaaaaaaaaaa", 2).await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].text.contains("https://example.com/a"));
    assert!(results[0].score > results[1].score);
}
