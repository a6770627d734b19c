//! Configuration for the question-answering pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable holding the API key for the hosted provider.
///
/// Its absence is detected before any network call is attempted.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Top-level configuration document.
///
/// The `model`, `data.vectorstore_path`, and `rag` values have no defaults:
/// a document missing them fails at load time rather than falling back to
/// something silent mid-pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalConfig {
    /// Chunking parameters and generation model
    pub model: ModelConfig,
    /// Corpus and index locations
    pub data: DataConfig,
    /// Retrieval and generation bounds
    pub rag: RagConfig,
    /// Generation endpoint settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl HospitalConfig {
    /// Load and validate a configuration document.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges. Called by `load`; exposed for callers that
    /// construct a configuration programmatically.
    pub fn validate(&self) -> Result<()> {
        if self.model.chunk_size == 0 {
            return Err(Error::config("model.chunk_size must be greater than zero"));
        }
        if self.model.chunk_overlap >= self.model.chunk_size {
            return Err(Error::config(
                "model.chunk_overlap must be smaller than model.chunk_size",
            ));
        }
        if self.model.llm_model.is_empty() {
            return Err(Error::config("model.llm_model must not be empty"));
        }
        if self.rag.top_k == 0 {
            return Err(Error::config("rag.top_k must be greater than zero"));
        }
        if self.rag.max_tokens == 0 {
            return Err(Error::config("rag.max_tokens must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for HospitalConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            data: DataConfig::default(),
            rag: RagConfig::default(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

/// Chunking parameters and the generation model identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap carried over from the previous chunk's tail, in characters
    pub chunk_overlap: usize,
    /// Generation model identifier
    pub llm_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            llm_model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Corpus and index locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the persisted vector index
    pub vectorstore_path: PathBuf,
    /// Raw training corpus (delimited text)
    #[serde(default = "default_train_path")]
    pub train_path: PathBuf,
    /// Raw validation corpus (delimited text)
    #[serde(default = "default_validation_path")]
    pub validation_path: PathBuf,
    /// Processed training corpus written by preparation
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,
    /// Processed validation corpus written by preparation
    #[serde(default = "default_validation_corpus_path")]
    pub validation_corpus_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            vectorstore_path: PathBuf::from("data/vectorstore"),
            train_path: default_train_path(),
            validation_path: default_validation_path(),
            corpus_path: default_corpus_path(),
            validation_corpus_path: default_validation_corpus_path(),
        }
    }
}

fn default_train_path() -> PathBuf {
    PathBuf::from("data/raw/train.csv")
}

fn default_validation_path() -> PathBuf {
    PathBuf::from("data/raw/validation.csv")
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/processed/train_units.bin")
}

fn default_validation_corpus_path() -> PathBuf {
    PathBuf::from("data/processed/validation_units.bin")
}

/// Retrieval and generation bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Number of chunks retrieved per query
    pub top_k: usize,
    /// Output token bound for generation
    pub max_tokens: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_tokens: 500,
        }
    }
}

/// Generation endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sampling temperature; kept low for near-deterministic answers
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

/// Embedding provider settings.
///
/// The hosted model is preferred; the local ONNX model is the setup-time
/// fallback when the hosted provider cannot be reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Hosted embedding model identifier
    #[serde(default = "default_remote_model")]
    pub remote_model: String,
    /// Hosted model output dimensions
    #[serde(default = "default_remote_dimensions")]
    pub remote_dimensions: usize,
    /// Local fallback model (sentence-transformers ONNX export)
    #[serde(default = "default_local_model")]
    pub local_model: String,
    /// Local model output dimensions
    #[serde(default = "default_local_dimensions")]
    pub local_dimensions: usize,
    /// Maximum token sequence length for the local model
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Cache directory for downloaded local model files
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            remote_model: default_remote_model(),
            remote_dimensions: default_remote_dimensions(),
            local_model: default_local_model(),
            local_dimensions: default_local_dimensions(),
            max_length: default_max_length(),
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_remote_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_remote_dimensions() -> usize {
    1536
}

fn default_local_model() -> String {
    "paraphrase-multilingual-MiniLM-L12-v2".to_string()
}

fn default_local_dimensions() -> usize {
    384
}

fn default_max_length() -> usize {
    256
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/models")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    const VALID: &str = r#"
        [model]
        chunk_size = 500
        chunk_overlap = 50
        llm_model = "gpt-4o-mini"

        [data]
        vectorstore_path = "data/vectorstore"

        [rag]
        top_k = 3
        max_tokens = 500
    "#;

    #[test]
    fn load_accepts_minimal_document() {
        let file = write_config(VALID);
        let config = HospitalConfig::load(file.path()).expect("valid config");
        assert_eq!(config.model.chunk_size, 500);
        assert_eq!(config.rag.top_k, 3);
        // Ambient keys fall back to defaults.
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn load_rejects_missing_required_key() {
        let file = write_config(
            r#"
            [model]
            chunk_size = 500
            chunk_overlap = 50

            [data]
            vectorstore_path = "data/vectorstore"

            [rag]
            top_k = 3
            max_tokens = 500
        "#,
        );
        let err = HospitalConfig::load(file.path()).expect_err("llm_model missing");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn load_rejects_overlap_not_smaller_than_chunk_size() {
        let file = write_config(
            r#"
            [model]
            chunk_size = 100
            chunk_overlap = 100
            llm_model = "gpt-4o-mini"

            [data]
            vectorstore_path = "data/vectorstore"

            [rag]
            top_k = 3
            max_tokens = 500
        "#,
        );
        let err = HospitalConfig::load(file.path()).expect_err("overlap too large");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn load_rejects_zero_top_k() {
        let file = write_config(
            r#"
            [model]
            chunk_size = 100
            chunk_overlap = 10
            llm_model = "gpt-4o-mini"

            [data]
            vectorstore_path = "data/vectorstore"

            [rag]
            top_k = 0
            max_tokens = 500
        "#,
        );
        let err = HospitalConfig::load(file.path()).expect_err("top_k is zero");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn load_rejects_missing_file() {
        let err = HospitalConfig::load(Path::new("no/such/config.toml"))
            .expect_err("missing file");
        assert!(matches!(err, Error::Config(_)));
    }
}
