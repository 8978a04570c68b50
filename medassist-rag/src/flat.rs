//! Exact (brute-force) vector index with JSON persistence.
//!
//! [`FlatIndex`] keeps entries in insertion order and scores every entry on
//! each search. On disk it is a directory with two files:
//!
//! - `index.json`: format version, embedding model id, metric, dimensions,
//!   and the ordered ids with their vectors
//! - `docstore.json`: id → chunk text and metadata

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// On-disk format version written by [`FlatIndex::save`].
pub const FORMAT_VERSION: u32 = 1;

/// File holding ids and vectors.
pub const INDEX_FILE: &str = "index.json";
/// File holding chunk text and metadata.
pub const DOCSTORE_FILE: &str = "docstore.json";

/// How the distance between two vectors is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared Euclidean distance. Lower is closer.
    #[default]
    L2,
    /// Cosine similarity. Higher is closer.
    Cosine,
}

impl DistanceMetric {
    /// Whether a larger score means a closer match.
    pub fn higher_is_better(self) -> bool {
        matches!(self, DistanceMetric::Cosine)
    }

    /// Score `b` against `a` under this metric.
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::L2 => squared_l2(a, b),
            DistanceMetric::Cosine => cosine_similarity(a, b),
        }
    }

    fn compare(self, a: f32, b: f32) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        if self.higher_is_better() { ord.reverse() } else { ord }
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Debug, Clone)]
struct Entry {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// An ordered, exact vector index.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    model_id: String,
    dimensions: usize,
    metric: DistanceMetric,
    entries: Vec<Entry>,
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    model_id: String,
    metric: DistanceMetric,
    dimensions: usize,
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

#[derive(Serialize, Deserialize)]
struct StoredChunk {
    text: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given model and size.
    pub fn new(model_id: impl Into<String>, dimensions: usize, metric: DistanceMetric) -> Self {
        Self { model_id: model_id.into(), dimensions, metric, entries: Vec::new() }
    }

    /// Identifier of the embedding model the vectors came from.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Length of every stored vector.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Distance metric used by [`search`](Self::search).
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append chunks with their vectors, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::BuildError`] if the counts differ or any vector
    /// has the wrong length. Nothing is appended in that case.
    pub fn add(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != vectors.len() {
            return Err(RagError::BuildError(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(RagError::BuildError(format!(
                "embedding has {} dimensions, index expects {}",
                bad.len(),
                self.dimensions
            )));
        }

        self.entries.extend(
            chunks.into_iter().zip(vectors).map(|(chunk, vector)| Entry { chunk, vector }),
        );
        Ok(())
    }

    /// Return the `k` closest entries to `query`, best first.
    ///
    /// `k` is capped at the number of entries. Equal scores keep insertion
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::QueryError`] if the query vector has the wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if query.len() != self.dimensions {
            return Err(RagError::QueryError(format!(
                "query embedding has {} dimensions, index expects {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, self.metric.score(&entry.vector, query)))
            .collect();

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| self.metric.compare(a.1, b.1));
        scored.truncate(k.min(self.entries.len()));

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult { chunk: self.entries[i].chunk.clone(), score })
            .collect())
    }

    /// Write `index.json` and `docstore.json` into `dir`, creating it and
    /// any missing parents.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PersistError`] on any filesystem or encoding failure.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let persist_err =
            |message: String| RagError::PersistError { path: dir.to_path_buf(), message };

        fs::create_dir_all(dir).map_err(|e| persist_err(e.to_string()))?;

        let index = IndexFile {
            version: FORMAT_VERSION,
            model_id: self.model_id.clone(),
            metric: self.metric,
            dimensions: self.dimensions,
            ids: self.entries.iter().map(|e| e.chunk.id.clone()).collect(),
            vectors: self.entries.iter().map(|e| e.vector.clone()).collect(),
        };
        let docstore: HashMap<&str, StoredChunk> = self
            .entries
            .iter()
            .map(|e| {
                (
                    e.chunk.id.as_str(),
                    StoredChunk { text: e.chunk.text.clone(), metadata: e.chunk.metadata.clone() },
                )
            })
            .collect();

        let index_json = serde_json::to_vec(&index).map_err(|e| persist_err(e.to_string()))?;
        let docstore_json =
            serde_json::to_vec(&docstore).map_err(|e| persist_err(e.to_string()))?;

        fs::write(dir.join(INDEX_FILE), index_json).map_err(|e| persist_err(e.to_string()))?;
        fs::write(dir.join(DOCSTORE_FILE), docstore_json)
            .map_err(|e| persist_err(e.to_string()))?;
        Ok(())
    }

    /// Read an index previously written by [`save`](Self::save).
    ///
    /// `expected_model_id` must match the model the index was built with.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RestoreError`] if either file is missing or
    /// malformed, the format version is unknown, the model id differs, a
    /// vector has the wrong length, or an id has no docstore entry.
    pub fn load(dir: &Path, expected_model_id: &str) -> Result<Self> {
        let restore_err =
            |message: String| RagError::RestoreError { path: dir.to_path_buf(), message };

        let index_bytes = fs::read(dir.join(INDEX_FILE))
            .map_err(|e| restore_err(format!("{INDEX_FILE}: {e}")))?;
        let docstore_bytes = fs::read(dir.join(DOCSTORE_FILE))
            .map_err(|e| restore_err(format!("{DOCSTORE_FILE}: {e}")))?;

        let index: IndexFile = serde_json::from_slice(&index_bytes)
            .map_err(|e| restore_err(format!("{INDEX_FILE}: {e}")))?;
        let mut docstore: HashMap<String, StoredChunk> = serde_json::from_slice(&docstore_bytes)
            .map_err(|e| restore_err(format!("{DOCSTORE_FILE}: {e}")))?;

        if index.version != FORMAT_VERSION {
            return Err(restore_err(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                index.version
            )));
        }
        if index.model_id != expected_model_id {
            return Err(restore_err(format!(
                "index was built with embedding model '{}', but '{}' is configured",
                index.model_id, expected_model_id
            )));
        }
        if index.ids.len() != index.vectors.len() {
            return Err(restore_err(format!(
                "{} ids but {} vectors",
                index.ids.len(),
                index.vectors.len()
            )));
        }

        let mut entries = Vec::with_capacity(index.ids.len());
        for (id, vector) in index.ids.into_iter().zip(index.vectors) {
            if vector.len() != index.dimensions {
                return Err(restore_err(format!(
                    "vector for '{id}' has {} dimensions, expected {}",
                    vector.len(),
                    index.dimensions
                )));
            }
            let stored = docstore
                .remove(&id)
                .ok_or_else(|| restore_err(format!("id '{id}' missing from {DOCSTORE_FILE}")))?;
            entries.push(Entry {
                chunk: Chunk { id, text: stored.text, metadata: stored.metadata },
                vector,
            });
        }

        Ok(Self {
            model_id: index.model_id,
            dimensions: index.dimensions,
            metric: index.metric,
            entries,
        })
    }
}
