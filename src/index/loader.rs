//! Loads persisted crawl documents and renders them for embedding

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The fields of a crawl document the index cares about
///
/// Other keys (`timestamp`, `domain`, ...) are ignored so documents from
/// any source directory with the same core schema load too.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceDocument {
    pub url: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl SourceDocument {
    /// True when the document carries non-empty content
    ///
    /// Whitespace-only content still counts; only a missing or empty
    /// `content` field is skipped.
    pub fn has_content(&self) -> bool {
        self.content
            .as_deref()
            .is_some_and(|content| !content.is_empty())
    }

    /// Renders the text that gets chunked and embedded
    ///
    /// The shape is fixed, since retrieved chunks are shown to the consumer
    /// as-is:
    ///
    /// ```text
    /// URL: {url}
    /// Title: {title}
    /// Content: {content}
    /// ```
    pub fn render(&self) -> String {
        format!(
            "URL: {}\nTitle: {}\nContent: {}",
            self.url.as_deref().unwrap_or("No URL"),
            self.title.as_deref().unwrap_or("No Title"),
            self.content.as_deref().unwrap_or("No Content")
        )
    }
}

#[derive(Debug, Error)]
enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error decoding JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads every `*.json` document of `directory` as rendered text
///
/// The scan is non-recursive and runs in file-name order. Nothing here is
/// fatal: a missing directory yields an empty list, and files that cannot be
/// read, do not decode, or have missing or empty content are logged and
/// skipped. A JSON array (the crawl's `full_dataset.json` snapshot) is
/// skipped because its documents also exist as individual files.
pub fn load_documents(directory: &Path) -> Vec<String> {
    if !directory.is_dir() {
        tracing::error!("Directory not found: {}", directory.display());
        return Vec::new();
    }

    let files = match json_files(directory) {
        Ok(files) => files,
        Err(e) => {
            tracing::error!("Error listing {}: {}", directory.display(), e);
            return Vec::new();
        }
    };

    if files.is_empty() {
        tracing::warn!("No JSON files found in {}", directory.display());
        return Vec::new();
    }

    let mut texts = Vec::new();
    for path in files {
        tracing::debug!("Processing file: {}", path.display());
        match load_document(&path) {
            Ok(Some(document)) if document.has_content() => texts.push(document.render()),
            Ok(Some(_)) => tracing::warn!("No content found in {}", path.display()),
            Ok(None) => tracing::debug!("Skipping aggregate snapshot {}", path.display()),
            Err(e) => tracing::error!("Error processing {}: {}", path.display(), e),
        }
    }

    texts
}

fn json_files(directory: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads one file; `Ok(None)` means the file holds an array, not a document
fn load_document(path: &Path) -> Result<Option<SourceDocument>, LoadError> {
    let raw = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    if value.is_array() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value)?))
}
