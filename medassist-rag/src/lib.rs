//! # medassist-rag
//!
//! Retrieval-augmented generation for the MedAssist healthcare FAQ assistant.
//!
//! ## Overview
//!
//! - [`loader`] reads `.txt` files and PDF pages into [`Document`]s
//! - [`RecursiveCharacterSplitter`] cuts documents into overlapping chunks
//! - [`EmbeddingProvider`] turns text into vectors; [`BertEmbeddingProvider`]
//!   runs a sentence-transformer locally (feature `bert`)
//! - [`RagSystem`] owns the vector index: build, add, query, persist, restore
//! - [`format_context`] renders retrieved chunks for a prompt
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use medassist_rag::{format_context, HashEmbeddingProvider, RagConfig, RagSystem};
//!
//! let mut rag = RagSystem::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashEmbeddingProvider::new(64)))
//!     .build()?;
//!
//! rag.build(&documents).await?;
//! let context = format_context(&rag.query_default("What is diabetes?").await?);
//! ```

#[cfg(feature = "bert")]
pub mod bert;
pub mod chunking;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod flat;
pub mod loader;
pub mod system;

#[cfg(feature = "bert")]
pub use bert::{BertEmbeddingProvider, DEFAULT_MODEL_ID};
pub use chunking::{Chunker, RecursiveCharacterSplitter};
pub use config::{RagConfig, RagConfigBuilder};
pub use context::format_context;
pub use document::{Chunk, Document, SearchResult};
pub use embedding::{EmbeddingProvider, HashEmbeddingProvider};
pub use error::{RagError, Result};
pub use flat::{DistanceMetric, FlatIndex};
pub use loader::{load_directory, load_file, load_upload};
pub use system::{IndexState, RagSystem, RagSystemBuilder};
