//! Domain types shared across the pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One canonical question/answer pair from the support corpus.
///
/// `id` is the row ordinal in the source table. Rows dropped during cleaning
/// leave gaps, so ids are sparse and must never be renumbered; validation
/// rows reference the same ordinals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaUnit {
    pub id: u32,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub metadata: HashMap<String, String>,
}

impl QaUnit {
    /// The combined text that gets chunked and indexed for this unit.
    pub fn combined_text(&self) -> String {
        format!("질문: {}\n답변: {}", self.question, self.answer)
    }
}

/// A slice of a unit's combined text; the atomic element of the vector index.
///
/// Carries the parent unit's metadata so retrieval results can surface the
/// original question and answer without a corpus lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub unit_id: u32,
    pub content: String,
    pub chunk_index: u32,
    pub metadata: HashMap<String, String>,
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query; higher is better.
    pub score: f32,
}

/// The result of a single `query` call. Created fresh per call, owned by the
/// caller, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub question: String,
    pub answer: String,
    /// Heuristic scalar in [0, 1]; an ordering signal, not a probability.
    pub confidence: f32,
    /// Source chunks in retrieval order.
    pub sources: Vec<ScoredChunk>,
}
