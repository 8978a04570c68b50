//! Data types for documents, indexed chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the path (or upload name) a document was read from.
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding the 0-based page number of a PDF page.
pub const PAGE_KEY: &str = "page";
/// Metadata key holding the position of a chunk within its source document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// A unit of text with key-value metadata.
///
/// Produced by the loader (one per text file or PDF page) and by the
/// chunker (one per window). Never mutated after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The text content.
    pub text: String,
    /// Key-value metadata, e.g. `source` and `page`.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), metadata: HashMap::new() }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The `source` metadata entry, if present.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A chunk stored in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier assigned when the chunk entered the index.
    pub id: String,
    /// The chunk text.
    pub text: String,
    /// Metadata inherited from the source document plus `chunk_index`.
    pub metadata: HashMap<String, String>,
}

impl AsRef<str> for Document {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl AsRef<str> for Chunk {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl From<Chunk> for Document {
    fn from(chunk: Chunk) -> Self {
        Self { text: chunk.text, metadata: chunk.metadata }
    }
}

/// A retrieved [`Chunk`] paired with its raw score.
///
/// The meaning of `score` depends on the index's
/// [`DistanceMetric`](crate::DistanceMetric): check
/// [`higher_is_better`](crate::DistanceMetric::higher_is_better) before
/// thresholding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Distance or similarity to the query.
    pub score: f32,
}
