//! Error types for the `medassist-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation or model loading.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A file extension the loader does not know how to read.
    #[error("Unsupported file type: {}", .0.display())]
    UnsupportedFileType(PathBuf),

    /// A file could not be read or parsed.
    #[error("Failed to load document from {}: {message}", path.display())]
    IngestionError {
        /// The file that failed to load.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// Building or extending the vector index failed.
    #[error("Index build error: {0}")]
    BuildError(String),

    /// A similarity query could not be executed.
    #[error("Index query error: {0}")]
    QueryError(String),

    /// Writing the index to disk failed.
    #[error("Failed to persist index to {}: {message}", path.display())]
    PersistError {
        /// Target directory.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// Reading the index from disk failed or the stored data is inconsistent.
    #[error("Failed to restore index from {}: {message}", path.display())]
    RestoreError {
        /// Source directory.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
