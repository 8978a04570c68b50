//! Application configuration.
//!
//! Precedence, lowest to highest:
//! 1. Programmatic defaults
//! 2. `medassist.toml` in the working directory, or the file given with `--config`
//! 3. Environment variables prefixed `MEDASSIST_`, nested with `__`
//!    (e.g. `MEDASSIST_RAG__TOP_K=5`)
//!
//! Provider API keys are read from `GROQ_API_KEY`, `OPENAI_API_KEY` and
//! `GOOGLE_API_KEY` when not set by the layers above.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use medassist_model::{ModelConfig, ProviderKind};
use medassist_rag::{DistanceMetric, RagConfig};
use medassist_search::SearchConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompt::ResponseMode;

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "medassist.toml";
/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "MEDASSIST_";

/// Default system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful medical information assistant. \
Provide accurate, evidence-based health information. \
Always remind users to consult healthcare professionals for medical advice.";

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// A layer could not be parsed or merged.
    #[error("Failed to load configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: LogFormat::Pretty }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Chunks retrieved per question.
    pub top_k: usize,
    /// Vector distance metric.
    pub metric: DistanceMetric,
    /// Hugging Face id of the sentence-embedding model.
    pub embedding_model: String,
    /// Directory holding the persisted index.
    pub vector_store_path: PathBuf,
    /// Directory scanned for `.txt` and `.pdf` files on first start.
    pub documents_path: PathBuf,
}

impl Default for RagSettings {
    fn default() -> Self {
        let rag = RagConfig::default();
        Self {
            chunk_size: rag.chunk_size,
            chunk_overlap: rag.chunk_overlap,
            top_k: rag.top_k,
            metric: rag.metric,
            embedding_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            vector_store_path: PathBuf::from("data/vector_store"),
            documents_path: PathBuf::from("data/medical_docs"),
        }
    }
}

impl RagSettings {
    /// The chunking and retrieval part as a [`RagConfig`].
    pub fn rag_config(&self) -> RagConfig {
        RagConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            top_k: self.top_k,
            metric: self.metric,
        }
    }
}

/// Prompt settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// System prompt used at the start of each session.
    pub system_prompt: String,
    /// Word ceiling stated for concise answers.
    pub concise_max_words: usize,
    /// Word ceiling stated for detailed answers.
    pub detailed_max_words: usize,
    /// Response mode at the start of each session.
    pub default_mode: ResponseMode,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            concise_max_words: 150,
            detailed_max_words: 500,
            default_mode: ResponseMode::Detailed,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Provider selected at startup; the first available one when unset.
    pub default_provider: Option<ProviderKind>,
    /// Hosted model settings.
    pub model: ModelConfig,
    /// Retrieval settings.
    pub rag: RagSettings,
    /// Web search settings.
    pub search: SearchConfig,
    /// Prompt settings.
    pub prompt: PromptSettings,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_provider: None,
            model: ModelConfig::default(),
            rag: RagSettings::default(),
            search: SearchConfig::default(),
            prompt: PromptSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration.
    ///
    /// `path` overrides [`DEFAULT_CONFIG_FILE`] and must exist when given.
    ///
    /// # Errors
    ///
    /// See [`ConfigError`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) if !path.exists() => return Err(ConfigError::MissingFile(path.into())),
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let mut config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(&file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        config.model = config.model.with_env_credentials();
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rag.rag_config().validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.search.max_results == 0 {
            return Err(ConfigError::Invalid("search.max_results must be greater than zero".into()));
        }
        if self.prompt.concise_max_words == 0 || self.prompt.detailed_max_words == 0 {
            return Err(ConfigError::Invalid("word limits must be greater than zero".into()));
        }
        if self.model.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "model.request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rag.top_k, 3);
        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.rag.vector_store_path, PathBuf::from("data/vector_store"));
        assert_eq!(config.prompt.concise_max_words, 150);
        assert_eq!(config.prompt.detailed_max_words, 500);
    }

    #[test]
    fn file_then_env_layers_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                default_provider = "gemini"

                [rag]
                top_k = 4
                chunk_size = 500
                chunk_overlap = 50

                [model.groq]
                model = "llama-3.1-8b-instant"
                "#,
            )?;
            jail.set_env("MEDASSIST_RAG__TOP_K", "6");
            jail.set_env("GOOGLE_API_KEY", "g-key");

            let config = AppConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.default_provider, Some(ProviderKind::Gemini));
            assert_eq!(config.rag.top_k, 6);
            assert_eq!(config.rag.chunk_size, 500);
            assert_eq!(config.model.groq.model, "llama-3.1-8b-instant");
            assert_eq!(config.model.groq.base_url, medassist_model::config::GROQ_API_BASE);
            assert_eq!(config.model.gemini.credential(), Some("g-key"));
            Ok(())
        });
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        Jail::expect_with(|jail| {
            jail.set_env("MEDASSIST_RAG__CHUNK_SIZE", "100");
            jail.set_env("MEDASSIST_RAG__CHUNK_OVERLAP", "100");
            assert!(matches!(AppConfig::load(None), Err(ConfigError::Invalid(_))));
            Ok(())
        });
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/medassist.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(_)));
    }
}
