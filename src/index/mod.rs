//! Index module: from persisted crawl documents to a retrievable vector index
//!
//! Pipeline, in order:
//! - `loader` reads `*.json` crawl documents and renders each as one text blob
//! - `chunker` splits every blob into overlapping fixed-size windows
//! - `embedder` turns chunk text into vectors through a hosted API
//! - `store` reuses the persisted index or builds and persists a new one

mod chunker;
mod embedder;
mod error;
mod loader;
mod store;

pub use chunker::Chunker;
pub use embedder::{Embedder, OpenAiEmbedder};
pub use error::{EmbedError, IndexError};
pub use loader::{load_documents, SourceDocument};
pub use store::{
    IndexManifest, IndexRecord, IndexStore, ScoredChunk, VectorIndex, FORMAT_VERSION, INDEX_FILE,
};
