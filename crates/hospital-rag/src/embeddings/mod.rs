//! Embedding providers and setup-time selection

mod local;
mod remote;

pub use local::LocalEmbedder;
pub use remote::RemoteEmbedder;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::HospitalConfig;
use crate::error::{Error, Result};

/// Trait for generating text embeddings
///
/// Implementations:
/// - `RemoteEmbedder`: hosted OpenAI-compatible embeddings endpoint
/// - `LocalEmbedder`: local ONNX sentence-transformer fallback
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts
    ///
    /// Default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Embedding dimensions
    fn dimensions(&self) -> usize;

    /// Check that the provider is reachable and usable
    async fn health_check(&self) -> Result<bool>;

    /// Provider name, recorded in the index manifest
    fn name(&self) -> &str;
}

/// Select the embedding provider once at setup time.
///
/// The hosted provider is tried first; the local model is activated only
/// when hosted setup fails. The choice is fixed for the lifetime of an
/// index build, never re-selected per call. When neither provider can be
/// set up the error propagates so the build fails as a whole.
pub async fn select_provider(config: &HospitalConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match RemoteEmbedder::from_config(config) {
        Ok(remote) => match remote.health_check().await {
            Ok(true) => {
                tracing::info!("embedding provider selected: {}", remote.name());
                return Ok(Arc::new(remote));
            }
            Ok(false) => {
                tracing::warn!("hosted embedding endpoint unreachable, trying local model")
            }
            Err(e) => tracing::warn!("hosted embedding health check failed: {}", e),
        },
        Err(e) => tracing::warn!("hosted embedder unavailable: {}", e),
    }

    let local = LocalEmbedder::new(config)
        .await
        .map_err(|e| Error::IndexBuild(format!("no embedding provider available: {}", e)))?;
    tracing::info!("embedding provider selected: {} (fallback)", local.name());
    Ok(Arc::new(local))
}
