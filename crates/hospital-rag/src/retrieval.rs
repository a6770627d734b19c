//! Query-time retrieval over the built index

use std::sync::Arc;

use crate::embeddings::EmbeddingProvider;
use crate::error::Result;
use crate::index::VectorIndex;
use crate::types::ScoredChunk;

/// Retrieves the chunks most similar to a query string.
///
/// The embedding provider is the one pinned when the index was built, so
/// queries land in the same vector space as the indexed chunks.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// The index being searched.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Top-`k` chunks by descending similarity.
    ///
    /// Assumes `k > 0` (the caller validates); returns fewer than `k`
    /// results only when the index holds fewer chunks in total.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed(query).await?;
        Ok(search_embedded(&self.index, &query_embedding, k))
    }
}

/// Score and rank all entries against an already-embedded query.
///
/// The sort is stable, so equal scores keep their original chunk insertion
/// order.
pub fn search_embedded(index: &VectorIndex, query_embedding: &[f32], k: usize) -> Vec<ScoredChunk> {
    let mut results: Vec<ScoredChunk> = index
        .entries()
        .iter()
        .map(|entry| ScoredChunk {
            chunk: entry.chunk.clone(),
            score: cosine_similarity(query_embedding, &entry.embedding),
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(k);
    results
}

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]) + 1.0).abs() < 1e-6);
    }
}
