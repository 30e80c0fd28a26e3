//! Persisted vector index
//!
//! On disk an index is one directory holding `index.json`: a manifest
//! describing how the index was built, followed by every chunk with its
//! embedding. The directory's existence is what `initialize` takes as "an
//! index is present", so a build is staged in a sibling directory and only
//! renamed into place once complete.

use crate::config::Config;
use crate::index::chunker::Chunker;
use crate::index::embedder::Embedder;
use crate::index::loader::load_documents;
use crate::index::{EmbedError, IndexError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// File inside the persist directory holding the whole index
pub const INDEX_FILE: &str = "index.json";

/// Bumped whenever the on-disk layout changes
pub const FORMAT_VERSION: u32 = 1;

/// How an index was built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub model: String,
    pub dimension: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub created_at: DateTime<Utc>,
}

/// One chunk and its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A retrieved chunk with its cosine similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f32,
}

/// An index loaded in memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    manifest: IndexManifest,
    records: Vec<IndexRecord>,
}

impl VectorIndex {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    /// Returns the `k` records most similar to `query`, best first
    ///
    /// Ties keep chunk order. A zero vector on either side scores 0.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        if query.len() != self.manifest.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.manifest.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(f32, &IndexRecord)> = self
            .records
            .iter()
            .map(|record| (cosine_similarity(query, &record.embedding), record))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, record)| ScoredChunk {
                text: record.text.clone(),
                score,
            })
            .collect())
    }

    /// Checks the invariants a freshly decoded index must hold
    fn validate(&self, model: &str) -> Result<(), String> {
        if self.manifest.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {})",
                self.manifest.format_version, FORMAT_VERSION
            ));
        }
        if self.manifest.model != model {
            return Err(format!(
                "built with model {}, configured model is {}",
                self.manifest.model, model
            ));
        }
        if self.records.is_empty() {
            return Err("index holds no records".to_string());
        }
        if let Some(record) = self
            .records
            .iter()
            .find(|record| record.embedding.len() != self.manifest.dimension)
        {
            return Err(format!(
                "record {} has {} dimensions, manifest says {}",
                record.id,
                record.embedding.len(),
                self.manifest.dimension
            ));
        }
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Opens or builds the vector index behind the retrieval pipeline
///
/// # Lifecycle
///
/// `initialize` reuses the directory at `persist_path` when it holds a valid
/// index. A directory that fails to open is deleted and rebuilt from the
/// source directories. A missing directory is simply built. Building embeds
/// every chunk, so it is the only expensive path.
pub struct IndexStore<E: Embedder> {
    embedder: E,
    persist_path: PathBuf,
    sources: Vec<PathBuf>,
    chunker: Chunker,
    batch_size: usize,
    force_rebuild: bool,
}

impl<E: Embedder> IndexStore<E> {
    pub fn new(config: &Config, embedder: E) -> Result<Self, IndexError> {
        Ok(Self {
            embedder,
            persist_path: config.index.persist_path.clone(),
            sources: config.index.source_directories.clone(),
            chunker: Chunker::new(config.index.chunk_size, config.index.chunk_overlap)?,
            batch_size: config.embedding.batch_size.max(1),
            force_rebuild: config.index.force_rebuild,
        })
    }

    /// Overrides the configured force-rebuild flag
    pub fn with_force_rebuild(mut self, force_rebuild: bool) -> Self {
        self.force_rebuild = force_rebuild;
        self
    }

    pub fn persist_path(&self) -> &Path {
        &self.persist_path
    }

    /// Returns a ready index, reusing the persisted one when possible
    ///
    /// Only a failed rebuild is an error; an unreadable existing index is
    /// logged, removed and replaced.
    pub async fn initialize(&self) -> Result<VectorIndex, IndexError> {
        if self.persist_path.exists() {
            if self.force_rebuild {
                // The old index stays in place until the new one is written
                tracing::info!(
                    "Rebuild requested, replacing index at {}",
                    self.persist_path.display()
                );
            } else {
                match self.open() {
                    Ok(index) => {
                        tracing::info!(
                            "Successfully loaded existing vector store ({} chunks)",
                            index.len()
                        );
                        return Ok(index);
                    }
                    Err(e) => {
                        tracing::error!("Error loading vector store: {}", e);
                        if let Err(e) = fs::remove_dir_all(&self.persist_path) {
                            tracing::warn!(
                                "Could not remove {}: {}",
                                self.persist_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        tracing::info!("Creating new vector store");
        self.build().await
    }

    /// Reads and validates the index at `persist_path`
    pub fn open(&self) -> Result<VectorIndex, IndexError> {
        let file = self.persist_path.join(INDEX_FILE);
        let open_error = |reason: String| IndexError::Open {
            path: self.persist_path.clone(),
            reason,
        };

        let raw = fs::read_to_string(&file)
            .map_err(|e| open_error(format!("cannot read {}: {}", file.display(), e)))?;
        let index: VectorIndex = serde_json::from_str(&raw)
            .map_err(|e| open_error(format!("cannot decode {}: {}", file.display(), e)))?;
        index.validate(self.embedder.model()).map_err(open_error)?;

        Ok(index)
    }

    /// Builds a fresh index from the source directories and persists it
    ///
    /// A failed build leaves `persist_path` as it was.
    pub async fn build(&self) -> Result<VectorIndex, IndexError> {
        let start_time = Instant::now();

        let mut texts = Vec::new();
        for source in &self.sources {
            let loaded = load_documents(source);
            tracing::info!("Loaded {} documents from {}", loaded.len(), source.display());
            texts.extend(loaded);
        }
        if texts.is_empty() {
            return Err(IndexError::NoContent(
                "No documents available for vector store creation".to_string(),
            ));
        }

        let chunks = self.chunker.split_all(&texts);
        if chunks.is_empty() {
            return Err(IndexError::NoContent(
                "Documents produced no chunks".to_string(),
            ));
        }
        tracing::info!(
            "Split {} documents into {} chunks (size {}, overlap {})",
            texts.len(),
            chunks.len(),
            self.chunker.size(),
            self.chunker.overlap()
        );

        let embeddings = self.embed_chunks(&chunks).await?;
        let dimension = embeddings.first().map(Vec::len).unwrap_or_default();

        let index = VectorIndex {
            manifest: IndexManifest {
                format_version: FORMAT_VERSION,
                model: self.embedder.model().to_string(),
                dimension,
                chunk_size: self.chunker.size(),
                chunk_overlap: self.chunker.overlap(),
                created_at: Utc::now(),
            },
            records: chunks
                .into_iter()
                .zip(embeddings)
                .enumerate()
                .map(|(id, (text, embedding))| IndexRecord {
                    id,
                    text,
                    embedding,
                })
                .collect(),
        };

        self.persist(&index)?;

        tracing::info!(
            "Vector store created at {} with {} chunks in {:?}",
            self.persist_path.display(),
            index.len(),
            start_time.elapsed()
        );
        Ok(index)
    }

    /// Embeds `text` and returns the `k` closest chunks of `index`
    pub async fn query(
        &self,
        index: &VectorIndex,
        text: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        let mut vectors = self.embedder.embed(&[text.to_string()]).await?;
        let query = vectors.pop().ok_or_else(|| {
            IndexError::Embedding(EmbedError::Response(
                "no embedding returned for query".to_string(),
            ))
        })?;
        index.search(&query, k)
    }

    async fn embed_chunks(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        let batches = chunks.len().div_ceil(self.batch_size);

        for (n, batch) in chunks.chunks(self.batch_size).enumerate() {
            tracing::debug!("Embedding batch {}/{} ({} chunks)", n + 1, batches, batch.len());
            let vectors = self.embedder.embed(batch).await?;
            if vectors.len() != batch.len() {
                return Err(IndexError::Embedding(EmbedError::Response(
                    format!("{} embeddings returned for {} chunks", vectors.len(), batch.len()),
                )));
            }

            for vector in vectors {
                let expected = embeddings.first().map(Vec::len).unwrap_or(vector.len());
                if vector.is_empty() || vector.len() != expected {
                    return Err(IndexError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                embeddings.push(vector);
            }
        }

        Ok(embeddings)
    }

    /// Writes into a staging sibling, then swaps it onto `persist_path`
    ///
    /// An index already at `persist_path` is only removed once the staged
    /// one is fully written.
    fn persist(&self, index: &VectorIndex) -> Result<(), IndexError> {
        let staging = staging_path(&self.persist_path)?;
        if staging.exists() {
            remove_dir(&staging)?;
        }

        let result = write_index(&staging, index)
            .and_then(|()| {
                if self.persist_path.exists() {
                    remove_dir(&self.persist_path)?;
                }
                Ok(())
            })
            .and_then(|()| {
                fs::rename(&staging, &self.persist_path).map_err(|source| {
                    IndexError::Filesystem {
                        path: self.persist_path.clone(),
                        source,
                    }
                })
            });

        if result.is_err() && staging.exists() {
            if let Err(e) = fs::remove_dir_all(&staging) {
                tracing::warn!("Could not remove {}: {}", staging.display(), e);
            }
        }
        result
    }
}

fn staging_path(persist_path: &Path) -> Result<PathBuf, IndexError> {
    let mut name = persist_path
        .file_name()
        .ok_or_else(|| IndexError::Filesystem {
            path: persist_path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "persist path has no final component",
            ),
        })?
        .to_os_string();
    name.push(".building");
    Ok(persist_path.with_file_name(name))
}

fn write_index(dir: &Path, index: &VectorIndex) -> Result<(), IndexError> {
    fs::create_dir_all(dir).map_err(|source| IndexError::Filesystem {
        path: dir.to_path_buf(),
        source,
    })?;
    let file = dir.join(INDEX_FILE);
    let json = serde_json::to_string(index)?;
    fs::write(&file, json).map_err(|source| IndexError::Filesystem { path: file, source })
}

fn remove_dir(path: &Path) -> Result<(), IndexError> {
    fs::remove_dir_all(path).map_err(|source| IndexError::Filesystem {
        path: path.to_path_buf(),
        source,
    })
}
