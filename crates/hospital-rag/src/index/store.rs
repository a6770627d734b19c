//! Vector index build and persistence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::HospitalConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::types::{Chunk, QaUnit};

use super::chunker::TextChunker;

/// File name of the persisted index inside the vectorstore directory.
pub const INDEX_FILE: &str = "index.bin";

/// One indexed entry: a chunk and its embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// The persisted, similarity-searchable chunk index.
///
/// Built once per corpus version and read-only at query time. The manifest
/// fields record what the entries were built from so a stale or mismatched
/// index is rebuilt instead of silently reused.
#[derive(Debug, Serialize, Deserialize)]
pub struct VectorIndex {
    /// Embedding dimensions of every entry
    pub dimensions: usize,
    /// Name of the provider the chunks were embedded with
    pub provider: String,
    /// Hash of the corpus the index was built from
    pub corpus_hash: String,
    /// Build timestamp
    pub built_at: DateTime<Utc>,
    /// Entries in insertion order
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Entries in their original insertion order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of chunks in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a previously persisted index from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(INDEX_FILE);
        let bytes = std::fs::read(&path)
            .map_err(|e| Error::IndexBuild(format!("{}: {}", path.display(), e)))?;
        let (index, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| Error::IndexBuild(format!("{}: index decode failed: {}", path.display(), e)))?;
        Ok(index)
    }

    /// Persist the index, replacing whatever is at the target location.
    ///
    /// Writes to a temporary file and renames it into place: a failed build
    /// never leaves a partial index behind, and repeated builds against the
    /// same location replace rather than append.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| Error::IndexBuild(format!("index encode failed: {}", e)))?;
        let tmp = dir.join(format!("{}.tmp", INDEX_FILE));
        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, dir.join(INDEX_FILE))?;
        tracing::info!("persisted index with {} chunks to {}", self.len(), dir.display());
        Ok(())
    }
}

/// Builds the vector index from cleaned units.
pub struct IndexBuilder {
    chunker: TextChunker,
    provider: Arc<dyn EmbeddingProvider>,
}

impl IndexBuilder {
    /// Create a builder bound to an embedding provider. The provider stays
    /// fixed for the whole build.
    pub fn new(config: &HospitalConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            chunker: TextChunker::new(config.model.chunk_size, config.model.chunk_overlap),
            provider,
        }
    }

    /// Chunk and embed `units` into a fresh index.
    pub async fn build(&self, units: &[QaUnit]) -> Result<VectorIndex> {
        if units.is_empty() {
            return Err(Error::index_build("corpus is empty"));
        }

        let mut entries = Vec::new();
        for unit in units {
            let combined = unit.combined_text();
            for (chunk_index, content) in self.chunker.chunk(&combined).into_iter().enumerate() {
                let embedding = self.provider.embed(&content).await.map_err(|e| {
                    Error::IndexBuild(format!("embedding chunk of unit {}: {}", unit.id, e))
                })?;

                let mut metadata = unit.metadata.clone();
                metadata.insert("question".to_string(), unit.question.clone());
                metadata.insert("answer".to_string(), unit.answer.clone());
                metadata.insert("category".to_string(), unit.category.clone());

                entries.push(IndexEntry {
                    chunk: Chunk {
                        id: Uuid::new_v4(),
                        unit_id: unit.id,
                        content,
                        chunk_index: chunk_index as u32,
                        metadata,
                    },
                    embedding,
                });
            }
        }

        tracing::info!("indexed {} units into {} chunks", units.len(), entries.len());

        Ok(VectorIndex {
            dimensions: self.provider.dimensions(),
            provider: self.provider.name().to_string(),
            corpus_hash: corpus_hash(units),
            built_at: Utc::now(),
            entries,
        })
    }
}

/// Content hash of a unit sequence, recorded in the index manifest so a
/// changed corpus invalidates the persisted build.
pub fn corpus_hash(units: &[QaUnit]) -> String {
    let mut hasher = Sha256::new();
    for unit in units {
        hasher.update(unit.id.to_le_bytes());
        hasher.update(unit.question.as_bytes());
        hasher.update(unit.answer.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
