//! Process-wide application state.
//!
//! [`AppContext`] owns the configuration, the web search client and the
//! retrieval system. The retrieval system is created on first use: a
//! persisted index is restored when one exists, otherwise one is built from
//! the documents directory and persisted. If neither works it starts empty.

use std::path::Path;
use std::sync::Arc;

use medassist_model::{ModelProvider, ProviderKind, available_providers, create_provider};
use medassist_rag::{EmbeddingProvider, RagError, RagSystem, format_context, load_upload};
use medassist_search::{WebSearch, is_empty_sentinel};
use tokio::sync::{OnceCell, RwLock};
use tracing::{error, info, warn};

use crate::config::{AppConfig, RagSettings};
use crate::error::{AppError, Result};

/// Outcome of adding an uploaded file.
#[derive(Debug)]
pub struct UploadReport {
    /// Chunks added to the in-memory index.
    pub chunks_added: usize,
    /// Set when the chunks were added but the index could not be saved.
    pub persist_error: Option<RagError>,
}

/// Shared state for one running assistant.
pub struct AppContext {
    config: AppConfig,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    // An `Err` records an embedding model that could not be loaded.
    rag: OnceCell<std::result::Result<RwLock<RagSystem>, String>>,
    search: WebSearch,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("rag_initialized", &self.rag.initialized())
            .field("search", &self.search)
            .finish()
    }
}

impl AppContext {
    /// Create a context that loads the configured embedding model on first use.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Search`] if the HTTP client cannot be built.
    pub fn new(config: AppConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Create a context with a specific embedding provider.
    pub fn with_embedder(config: AppConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        Self::build(config, Some(embedder))
    }

    fn build(config: AppConfig, embedder: Option<Arc<dyn EmbeddingProvider>>) -> Result<Self> {
        let search = WebSearch::new(&config.search)?;
        Ok(Self { config, embedder, rag: OnceCell::new(), search })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Providers with a configured API key.
    pub fn available_providers(&self) -> Vec<ProviderKind> {
        available_providers(&self.config.model)
    }

    /// Construct the model provider for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Model`] if the provider has no credential.
    pub fn provider(&self, kind: ProviderKind) -> Result<Arc<dyn ModelProvider>> {
        Ok(create_provider(kind, &self.config.model)?)
    }

    /// The retrieval system, initialising it on first call.
    ///
    /// Initialisation runs once. If the stored index cannot be restored and
    /// the documents cannot be indexed, the system starts empty and uploads
    /// still work.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the embedding model could not
    /// be loaded. The failure is remembered; the model is not fetched again.
    pub async fn rag(&self) -> std::result::Result<&RwLock<RagSystem>, RagError> {
        match self.rag.get_or_init(|| self.init_rag()).await {
            Ok(rag) => Ok(rag),
            Err(message) => Err(RagError::EmbeddingError {
                provider: self.config.rag.embedding_model.clone(),
                message: message.clone(),
            }),
        }
    }

    async fn init_rag(&self) -> std::result::Result<RwLock<RagSystem>, String> {
        let settings = &self.config.rag;
        let embedder = match &self.embedder {
            Some(embedder) => Arc::clone(embedder),
            None => load_embedder(settings).await.map_err(|e| {
                error!(
                    model = %settings.embedding_model,
                    error = %e,
                    "embedding model unavailable"
                );
                e.to_string()
            })?,
        };

        let rag = RagSystem::builder()
            .config(settings.rag_config())
            .embedding_provider(embedder)
            .build()
            .map_err(|e| e.to_string())?;

        let store = settings.vector_store_path.clone();
        let (mut rag, restored) = with_blocking(rag, move |rag| rag.restore(&store))
            .await
            .map_err(|e| e.to_string())?;
        let restored = restored.unwrap_or_else(|e| {
            warn!(
                path = %settings.vector_store_path.display(),
                error = %e,
                "discarding unusable vector store"
            );
            false
        });

        if !restored {
            let built = rag.build_from_directory(&settings.documents_path).await;
            match built {
                Ok(true) => {
                    let store = settings.vector_store_path.clone();
                    let (persisted, saved) = with_blocking(rag, move |rag| rag.persist(&store))
                        .await
                        .map_err(|e| e.to_string())?;
                    rag = persisted;
                    if let Err(e) = saved {
                        warn!(error = %e, "continuing with an unpersisted index");
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        path = %settings.documents_path.display(),
                        error = %e,
                        "starting with an empty knowledge base"
                    );
                }
            }
        }

        info!(chunk_count = rag.len(), restored, "retrieval system ready");
        Ok(RwLock::new(rag))
    }

    /// Retrieve and format knowledge-base context for `query`.
    ///
    /// Empty when the index has no entries.
    pub async fn retrieve(&self, query: &str) -> std::result::Result<String, RagError> {
        let rag = self.rag().await?.read().await;
        let chunks = rag.query_default(query).await?;
        Ok(format_context(&chunks))
    }

    /// Formatted web search results for `query`, or an empty string.
    pub async fn web_context(&self, query: &str) -> String {
        let results = self.search.search_and_format(query, self.config.search.max_results).await;
        if is_empty_sentinel(&results) { String::new() } else { results }
    }

    /// Add an uploaded file to the knowledge base and persist the index.
    ///
    /// A failed save does not undo the addition; it is reported in
    /// [`UploadReport::persist_error`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError`] if the file cannot be loaded or embedded.
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> std::result::Result<UploadReport, RagError> {
        let name = file_name.to_string();
        let documents = tokio::task::spawn_blocking(move || load_upload(&name, &bytes))
            .await
            .map_err(|e| RagError::BuildError(format!("upload task failed: {e}")))??;

        let mut rag = self.rag().await?.write().await;
        let chunks_added = rag.add(&documents).await?;
        // Saved under the write lock so concurrent uploads never interleave
        // partial writes of the store.
        let persist_error = rag.persist(&self.config.rag.vector_store_path).err();
        match &persist_error {
            None => info!(file_name, chunk_count = chunks_added, "uploaded document"),
            Some(e) => warn!(
                file_name,
                chunk_count = chunks_added,
                error = %e,
                "uploaded document not saved"
            ),
        }
        Ok(UploadReport { chunks_added, persist_error })
    }

    /// Read `path` and [`upload`](Self::upload) it under its file name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the file cannot be read.
    pub async fn upload_path(&self, path: &Path) -> Result<UploadReport> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AppError::Io { path: path.to_path_buf(), source })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(self.upload(&file_name, bytes).await.inspect_err(|e| {
            error!(path = %path.display(), error = %e, "upload failed");
        })?)
    }
}

/// Run a filesystem operation on `rag` on the blocking thread pool.
async fn with_blocking<T, F>(
    mut rag: RagSystem,
    op: F,
) -> std::result::Result<(RagSystem, T), RagError>
where
    T: Send + 'static,
    F: FnOnce(&mut RagSystem) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let out = op(&mut rag);
        (rag, out)
    })
    .await
    .map_err(|e| RagError::BuildError(format!("index storage task failed: {e}")))
}

#[cfg(feature = "bert")]
async fn load_embedder(
    settings: &RagSettings,
) -> std::result::Result<Arc<dyn EmbeddingProvider>, RagError> {
    let model = medassist_rag::BertEmbeddingProvider::load(&settings.embedding_model).await?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "bert"))]
async fn load_embedder(
    settings: &RagSettings,
) -> std::result::Result<Arc<dyn EmbeddingProvider>, RagError> {
    const DIMENSIONS: usize = 384;
    warn!(
        requested = %settings.embedding_model,
        "built without the `bert` feature, using hashed bag-of-words embeddings"
    );
    Ok(Arc::new(medassist_rag::HashEmbeddingProvider::new(DIMENSIONS)))
}
