//! JSON directory storage implementation

use crate::storage::{CrawlDocument, DocumentStore, StorageError, StorageResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the aggregate snapshot
pub const SNAPSHOT_FILE: &str = "full_dataset.json";

/// Writes crawl output as pretty-printed JSON files in one directory
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Opens the store, creating the directory (and parents) if needed
    pub fn open(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Directory the store writes into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of `doc_<position>.json`
    pub fn document_path(&self, position: usize) -> PathBuf {
        self.dir.join(format!("doc_{}.json", position))
    }

    /// Path of the aggregate snapshot
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: PathBuf, value: &T) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).map_err(|source| StorageError::Write { path, source })
    }
}

impl DocumentStore for JsonDirStore {
    fn save_document(&mut self, position: usize, document: &CrawlDocument) -> StorageResult<()> {
        let path = self.document_path(position);
        tracing::debug!("Writing {}", path.display());
        self.write_json(path, document)
    }

    fn save_snapshot(&mut self, documents: &[CrawlDocument]) -> StorageResult<()> {
        let path = self.snapshot_path();
        tracing::info!(
            "Writing {} documents to {}",
            documents.len(),
            path.display()
        );
        self.write_json(path, documents)
    }
}
