//! The RAG system: chunk, embed, index, search, persist.
//!
//! [`RagSystem`] owns one [`FlatIndex`] and composes an
//! [`EmbeddingProvider`] with a [`Chunker`].
//!
//! # Example
//!
//! ```rust,ignore
//! use medassist_rag::{HashEmbeddingProvider, RagConfig, RagSystem};
//!
//! let mut rag = RagSystem::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashEmbeddingProvider::new(64)))
//!     .build()?;
//!
//! rag.build_from_directory(Path::new("data/medical_docs")).await?;
//! let chunks = rag.query_default("What are the symptoms of diabetes?").await?;
//! rag.persist(Path::new("data/vector_store"))?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::chunking::{Chunker, RecursiveCharacterSplitter};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::flat::FlatIndex;
use crate::loader;

/// Lifecycle of a [`RagSystem`]'s index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// No index has been built, added to, or restored yet.
    NotInitialized,
    /// An index with at least one entry is available for queries.
    Ready,
}

/// Retrieval over a single in-memory vector index.
///
/// Mutating operations take `&mut self`; share it behind a
/// `tokio::sync::RwLock` for concurrent readers with a single writer.
pub struct RagSystem {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
    index: Option<FlatIndex>,
}

impl std::fmt::Debug for RagSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagSystem")
            .field("config", &self.config)
            .field("model_id", &self.embedding_provider.model_id())
            .field("entries", &self.len())
            .finish()
    }
}

impl RagSystem {
    /// Create a new [`RagSystemBuilder`].
    pub fn builder() -> RagSystemBuilder {
        RagSystemBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Current lifecycle state.
    pub fn state(&self) -> IndexState {
        match &self.index {
            Some(index) if !index.is_empty() => IndexState::Ready,
            _ => IndexState::NotInitialized,
        }
    }

    /// Whether queries can return results.
    pub fn is_ready(&self) -> bool {
        self.state() == IndexState::Ready
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.index.as_ref().map_or(0, FlatIndex::len)
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chunk and embed `documents`, replacing any existing index.
    ///
    /// Returns `Ok(false)` and leaves the index untouched if there is
    /// nothing to index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::BuildError`] if embedding fails.
    pub async fn build(&mut self, documents: &[Document]) -> Result<bool> {
        let chunks = self.chunker.split(documents);
        if chunks.is_empty() {
            info!(document_count = documents.len(), "no content to index");
            return Ok(false);
        }

        let mut index = self.new_index();
        let chunk_count = self.embed_into(&mut index, chunks).await?;
        self.index = Some(index);

        info!(document_count = documents.len(), chunk_count, "built vector index");
        Ok(true)
    }

    /// Load every supported file under `path` and [`build`](Self::build).
    ///
    /// A missing directory yields `Ok(false)`.
    ///
    /// # Errors
    ///
    /// See [`loader::load_directory`] and [`build`](Self::build).
    pub async fn build_from_directory(&mut self, path: &Path) -> Result<bool> {
        let dir = path.to_path_buf();
        let documents = tokio::task::spawn_blocking(move || loader::load_directory(&dir))
            .await
            .map_err(|e| RagError::BuildError(format!("document loading task failed: {e}")))??;
        info!(path = %path.display(), document_count = documents.len(), "loaded documents");
        self.build(&documents).await
    }

    /// Chunk, embed and append `documents`, creating the index if needed.
    ///
    /// Returns the number of chunks added. Content is not deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::BuildError`] if embedding fails; the existing
    /// index is left unchanged.
    pub async fn add(&mut self, documents: &[Document]) -> Result<usize> {
        let chunks = self.chunker.split(documents);
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut index = match self.index.take() {
            Some(index) => index,
            None => self.new_index(),
        };
        let result = self.embed_into(&mut index, chunks).await;
        let total = index.len();
        if !index.is_empty() {
            self.index = Some(index);
        }

        let added = result?;
        info!(chunk_count = added, total, "added documents to vector index");
        Ok(added)
    }

    /// Return the `k` chunks closest to `text`, best first.
    ///
    /// Empty if the index is not ready or `k == 0`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::QueryError`] if the query cannot be embedded.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<Chunk>> {
        Ok(self.query_scored(text, k).await?.into_iter().map(|r| r.chunk).collect())
    }

    /// [`query`](Self::query) with the configured `top_k`.
    pub async fn query_default(&self, text: &str) -> Result<Vec<Chunk>> {
        self.query(text, self.config.top_k).await
    }

    /// Like [`query`](Self::query) but keeps the raw score of each match.
    ///
    /// Check [`DistanceMetric::higher_is_better`](crate::DistanceMetric::higher_is_better)
    /// before interpreting scores.
    pub async fn query_scored(&self, text: &str, k: usize) -> Result<Vec<SearchResult>> {
        let Some(index) = self.index.as_ref().filter(|index| !index.is_empty()) else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedding_provider.embed(text).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            RagError::QueryError(format!("query embedding failed: {e}"))
        })?;

        let results = index.search(&embedding, k)?;
        info!(result_count = results.len(), "query completed");
        Ok(results)
    }

    /// Write the index to `path`.
    ///
    /// Returns `Ok(false)` if there is nothing to persist.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PersistError`] on filesystem or encoding failure.
    pub fn persist(&self, path: &Path) -> Result<bool> {
        let Some(index) = self.index.as_ref().filter(|index| !index.is_empty()) else {
            return Ok(false);
        };
        index.save(path).inspect_err(|e| {
            error!(path = %path.display(), error = %e, "failed to persist vector index");
        })?;
        info!(path = %path.display(), chunk_count = index.len(), "persisted vector index");
        Ok(true)
    }

    /// Replace the index with one previously written by [`persist`](Self::persist).
    ///
    /// Returns `Ok(false)` if `path` does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::RestoreError`] if the stored data is malformed,
    /// empty, or was built with a different embedding model or size.
    pub fn restore(&mut self, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        let index = FlatIndex::load(path, self.embedding_provider.model_id())?;
        let restore_err =
            |message: String| RagError::RestoreError { path: PathBuf::from(path), message };

        if index.dimensions() != self.embedding_provider.dimensions() {
            return Err(restore_err(format!(
                "index has {} dimensions, embedding provider produces {}",
                index.dimensions(),
                self.embedding_provider.dimensions()
            )));
        }
        if index.is_empty() {
            return Err(restore_err("index contains no entries".to_string()));
        }
        if index.metric() != self.config.metric {
            warn!(
                stored = ?index.metric(),
                configured = ?self.config.metric,
                "restored index uses a different distance metric than configured"
            );
        }

        info!(path = %path.display(), chunk_count = index.len(), "restored vector index");
        self.index = Some(index);
        Ok(true)
    }

    fn new_index(&self) -> FlatIndex {
        FlatIndex::new(
            self.embedding_provider.model_id(),
            self.embedding_provider.dimensions(),
            self.config.metric,
        )
    }

    async fn embed_into(&self, index: &mut FlatIndex, documents: Vec<Document>) -> Result<usize> {
        let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
        let vectors = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(chunk_count = texts.len(), error = %e, "embedding failed during indexing");
            RagError::BuildError(format!("embedding failed: {e}"))
        })?;

        let chunks: Vec<Chunk> = documents
            .into_iter()
            .map(|doc| Chunk {
                id: uuid::Uuid::new_v4().to_string(),
                text: doc.text,
                metadata: doc.metadata,
            })
            .collect();
        let count = chunks.len();
        index.add(chunks, vectors)?;
        Ok(count)
    }
}

/// Builder for constructing a [`RagSystem`].
///
/// `embedding_provider` is required. The chunker defaults to a
/// [`RecursiveCharacterSplitter`] sized from the config, and the config to
/// [`RagConfig::default`].
#[derive(Default)]
pub struct RagSystemBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagSystemBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagSystem`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the embedding provider is missing
    /// or the config is invalid.
    pub fn build(self) -> Result<RagSystem> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(RecursiveCharacterSplitter::new(config.chunk_size, config.chunk_overlap))
        });

        Ok(RagSystem { config, embedding_provider, chunker, index: None })
    }
}
