//! Local ONNX fallback embedder
//!
//! Runs a sentence-transformers model (multilingual MiniLM by default)
//! through ONNX Runtime so indexing still works when the hosted provider
//! is unavailable. Model files are downloaded once into the cache
//! directory and reused afterwards.

use async_trait::async_trait;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenizers::Tokenizer;

use crate::config::HospitalConfig;
use crate::error::{Error, Result};

use super::EmbeddingProvider;

/// ONNX-based local text embedder
pub struct LocalEmbedder {
    // Session::run takes &mut self; the trait surface is &self.
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    dimensions: usize,
    max_length: usize,
}

impl LocalEmbedder {
    /// Load (downloading on first use) the local model.
    pub async fn new(config: &HospitalConfig) -> Result<Self> {
        let embedding = &config.embedding;
        tracing::info!("initializing local embedder: {}", embedding.local_model);

        std::fs::create_dir_all(&embedding.cache_dir)
            .map_err(|e| Error::Embedding(format!("failed to create model cache: {}", e)))?;

        let model_path = embedding.cache_dir.join("model.onnx");
        let tokenizer_path = embedding.cache_dir.join("tokenizer.json");

        if !model_path.exists() {
            download_model_file(&embedding.local_model, "onnx/model.onnx", &model_path).await?;
        }
        if !tokenizer_path.exists() {
            download_model_file(&embedding.local_model, "tokenizer.json", &tokenizer_path).await?;
        }

        let session = Session::builder()
            .map_err(|e| Error::Embedding(format!("failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::Embedding(format!("failed to set optimization level: {}", e)))?
            .with_intra_threads(4)
            .map_err(|e| Error::Embedding(format!("failed to set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| Error::Embedding(format!("failed to load model: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::Embedding(format!("failed to load tokenizer: {}", e)))?;

        tracing::info!("local embedder ready");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            dimensions: embedding.local_dimensions,
            max_length: embedding.max_length,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let text = text.to_string();
        let max_length = self.max_length;
        let dimensions = self.dimensions;

        // Inference is CPU-bound; keep it off the async executor.
        tokio::task::spawn_blocking(move || {
            embed_blocking(&session, &tokenizer, &text, max_length, dimensions)
        })
        .await
        .map_err(|e| Error::Embedding(format!("embedding task failed: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "local-onnx"
    }
}

fn embed_blocking(
    session: &Mutex<Session>,
    tokenizer: &Tokenizer,
    text: &str,
    max_length: usize,
    dimensions: usize,
) -> Result<Vec<f32>> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| Error::Embedding(format!("tokenization failed: {}", e)))?;

    let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&v| v as i64).collect();
    let mut mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .map(|&v| v as i64)
        .collect();
    let mut type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&v| v as i64).collect();

    if ids.len() > max_length {
        ids.truncate(max_length);
        mask.truncate(max_length);
        type_ids.truncate(max_length);
    }
    let sequence_length = ids.len();
    let pooling_mask = mask.clone();

    let input_ids = Tensor::from_array((vec![1, sequence_length], ids.into_boxed_slice()))
        .map_err(|e| Error::Embedding(format!("input tensor creation failed: {}", e)))?;
    let attention_mask = Tensor::from_array((vec![1, sequence_length], mask.into_boxed_slice()))
        .map_err(|e| Error::Embedding(format!("mask tensor creation failed: {}", e)))?;
    let token_type_ids = Tensor::from_array((vec![1, sequence_length], type_ids.into_boxed_slice()))
        .map_err(|e| Error::Embedding(format!("type tensor creation failed: {}", e)))?;

    let mut session = session.lock();
    let outputs = session
        .run(vec![
            ("input_ids", input_ids.into_dyn()),
            ("attention_mask", attention_mask.into_dyn()),
            ("token_type_ids", token_type_ids.into_dyn()),
        ])
        .map_err(|e| Error::Embedding(format!("inference failed: {}", e)))?;

    let collected: Vec<_> = outputs.iter().collect();
    let output = collected
        .iter()
        .find(|(name, _)| *name == "last_hidden_state")
        .or_else(|| collected.first())
        .map(|(_, value)| value)
        .ok_or_else(|| Error::Embedding("no output tensor".to_string()))?;

    let (shape, data) = output
        .try_extract_tensor::<f32>()
        .map_err(|e| Error::Embedding(format!("failed to extract tensor: {}", e)))?;

    let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
    let hidden_size = dims.get(2).copied().unwrap_or(dimensions);

    // Mean pooling over the attention mask, then L2 normalization.
    let mut pooled = vec![0.0f32; hidden_size];
    let mut token_count = 0.0f32;
    for (position, &mask_value) in pooling_mask.iter().enumerate() {
        if mask_value > 0 {
            for component in 0..hidden_size {
                let index = position * hidden_size + component;
                if index < data.len() {
                    pooled[component] += data[index];
                }
            }
            token_count += 1.0;
        }
    }
    if token_count > 0.0 {
        for value in &mut pooled {
            *value /= token_count;
        }
    }

    let norm: f32 = pooled.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut pooled {
            *value /= norm;
        }
    }

    Ok(pooled)
}

/// Download one model artifact from the sentence-transformers hub.
async fn download_model_file(model_name: &str, remote_file: &str, path: &Path) -> Result<()> {
    let url = format!(
        "https://huggingface.co/sentence-transformers/{}/resolve/main/{}",
        model_name, remote_file
    );
    tracing::info!("downloading {}", url);

    let response = reqwest::get(&url)
        .await
        .map_err(|e| Error::Embedding(format!("download failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(Error::Embedding(format!(
            "download failed: HTTP {} for {}",
            response.status(),
            url
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Embedding(format!("failed to read download: {}", e)))?;

    write_atomically(path, &bytes)?;
    tracing::info!("saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

// A crashed download must not leave a half-written artifact that a later
// start would treat as cached.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = PathBuf::from(format!("{}.partial", path.display()));
    std::fs::write(&tmp, bytes)
        .map_err(|e| Error::Embedding(format!("failed to save {}: {}", tmp.display(), e)))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| Error::Embedding(format!("failed to save {}: {}", path.display(), e)))?;
    Ok(())
}
