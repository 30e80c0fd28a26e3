//! Fixed-window text chunking
//!
//! Windows are measured in characters (not bytes) so multi-byte text never
//! splits inside a code point.

use crate::index::IndexError;
use std::iter;

/// Splits text into overlapping windows of at most `size` characters
///
/// Window `n + 1` starts `size - overlap` characters after window `n`, so
/// the last `overlap` characters of a full window reappear at the start of
/// the next one. The final window may be shorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Creates a chunker; requires `size >= 1` and `overlap < size`
    pub fn new(size: usize, overlap: usize) -> Result<Self, IndexError> {
        if size == 0 {
            return Err(IndexError::Chunking("chunk size must be >= 1".to_string()));
        }
        if overlap >= size {
            return Err(IndexError::Chunking(format!(
                "overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Splits one document's text; empty text yields no chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        // Byte offset of every char boundary, including the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(iter::once(text.len()))
            .collect();
        let char_count = boundaries.len() - 1;

        let mut chunks = Vec::new();
        if char_count == 0 {
            return chunks;
        }

        let step = self.size - self.overlap;
        let mut start = 0;
        loop {
            let end = (start + self.size).min(char_count);
            chunks.push(text[boundaries[start]..boundaries[end]].to_string());
            if end == char_count {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Splits each text independently and concatenates the results in order
    pub fn split_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        texts
            .iter()
            .flat_map(|text| self.split(text.as_ref()))
            .collect()
    }
}
