//! Local sentence embeddings with a BERT model run by candle.
//!
//! The model files (`tokenizer.json`, `config.json`, `model.safetensors`) are
//! fetched from the Hugging Face Hub on first use and cached locally. Pipeline:
//!
//! 1. Tokenize with padding to the longest text in the batch and truncation
//!    to the model's maximum sequence length
//! 2. BERT forward pass
//! 3. Mean pooling weighted by the attention mask
//! 4. L2 normalisation

use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationDirection,
    TruncationParams, TruncationStrategy,
};
use tracing::{debug, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Default sentence-embedding model.
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

const PROVIDER: &str = "bert";
const MAX_BATCH: usize = 32;

fn embed_err(message: impl std::fmt::Display) -> RagError {
    RagError::EmbeddingError { provider: PROVIDER.to_string(), message: message.to_string() }
}

struct BertInner {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Embedding provider backed by a BERT sentence-transformer on the CPU.
///
/// Inference is CPU-bound and runs on the blocking thread pool.
#[derive(Clone)]
pub struct BertEmbeddingProvider {
    inner: Arc<BertInner>,
    model_id: String,
    dimensions: usize,
}

impl std::fmt::Debug for BertEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEmbeddingProvider")
            .field("model_id", &self.model_id)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl BertEmbeddingProvider {
    /// Download (or read from cache) and load the given Hugging Face model.
    ///
    /// Blocking: call from [`tokio::task::spawn_blocking`] or use
    /// [`load`](Self::load).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if any model file cannot be
    /// fetched or parsed.
    pub fn new(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;
        info!(model_id, "loading embedding model");

        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| embed_err(format!("failed to initialise Hugging Face API: {e}")))?;
        let repo = api.model(model_id.to_string());

        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| embed_err(format!("failed to fetch tokenizer.json: {e}")))?;
        let config_path = repo
            .get("config.json")
            .map_err(|e| embed_err(format!("failed to fetch config.json: {e}")))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| embed_err(format!("failed to fetch model.safetensors: {e}")))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| embed_err(format!("failed to load tokenizer: {e}")))?;

        let config_file = std::fs::read(&config_path)
            .map_err(|e| embed_err(format!("failed to read config.json: {e}")))?;
        let config: Config = serde_json::from_slice(&config_file)
            .map_err(|e| embed_err(format!("failed to parse config.json: {e}")))?;

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            direction: PaddingDirection::Right,
            pad_to_multiple_of: None,
            pad_id: 0,
            pad_type_id: 0,
            pad_token: "[PAD]".to_string(),
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_position_embeddings,
                strategy: TruncationStrategy::LongestFirst,
                stride: 0,
                direction: TruncationDirection::Right,
            }))
            .map_err(|e| embed_err(format!("failed to configure truncation: {e}")))?;

        let weights = std::fs::read(&weights_path)
            .map_err(|e| embed_err(format!("failed to read model weights: {e}")))?;
        let vb = VarBuilder::from_buffered_safetensors(weights, DType::F32, &device)
            .map_err(|e| embed_err(format!("failed to load model weights: {e}")))?;
        let model = BertModel::load(vb, &config)
            .map_err(|e| embed_err(format!("failed to build BERT model: {e}")))?;

        info!(
            model_id,
            dimensions = config.hidden_size,
            layers = config.num_hidden_layers,
            "embedding model loaded"
        );

        Ok(Self {
            inner: Arc::new(BertInner { model, tokenizer, device }),
            model_id: model_id.to_string(),
            dimensions: config.hidden_size,
        })
    }

    /// Load the model on the blocking thread pool.
    pub async fn load(model_id: &str) -> Result<Self> {
        let model_id = model_id.to_string();
        tokio::task::spawn_blocking(move || Self::new(&model_id))
            .await
            .map_err(|e| embed_err(format!("model loading task failed: {e}")))?
    }
}

impl BertInner {
    fn embed_batch_sync(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.iter().map(String::as_str).collect::<Vec<_>>(), true)
            .map_err(|e| embed_err(format!("tokenization failed: {e}")))?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);
        let ids: Vec<u32> = encodings.iter().flat_map(|e| e.get_ids().to_vec()).collect();
        let mask: Vec<u32> =
            encodings.iter().flat_map(|e| e.get_attention_mask().to_vec()).collect();

        let input_ids =
            Tensor::from_vec(ids, (batch_size, seq_len), &self.device).map_err(embed_err)?;
        let attention_mask =
            Tensor::from_vec(mask, (batch_size, seq_len), &self.device).map_err(embed_err)?;
        let token_type_ids = input_ids.zeros_like().map_err(embed_err)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| embed_err(format!("forward pass failed: {e}")))?;

        let pooled = mean_pool(&hidden, &attention_mask).map_err(embed_err)?;
        let normalized = normalize_l2(&pooled).map_err(embed_err)?;
        normalized.to_vec2::<f32>().map_err(embed_err)
    }
}

/// Average token states, ignoring padding.
fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let summed = hidden.mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f32::MAX)?;
    summed.div(&counts)
}

fn normalize_l2(embeddings: &Tensor) -> candle_core::Result<Tensor> {
    let norm = embeddings.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f32::MAX)?;
    embeddings.broadcast_div(&norm)
}

#[async_trait]
impl EmbeddingProvider for BertEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| embed_err("model returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            let owned: Vec<String> = batch.iter().map(|s| s.to_string()).collect();
            let inner = Arc::clone(&self.inner);
            debug!(batch_size = owned.len(), "embedding batch");
            let vectors = tokio::task::spawn_blocking(move || inner.embed_batch_sync(&owned))
                .await
                .map_err(|e| embed_err(format!("embedding task failed: {e}")))??;
            out.extend(vectors);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
