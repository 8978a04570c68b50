//! Application error types.

use std::path::PathBuf;

use medassist_model::ModelError;
use medassist_rag::RagError;
use medassist_search::SearchError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by the application layer.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rag(#[from] RagError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Web search setup failed: {0}")]
    Search(#[from] SearchError),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AppError>;
