//! Document indexing: chunking, embedding, persistence

mod chunker;
mod store;

pub use chunker::TextChunker;
pub use store::{corpus_hash, IndexBuilder, IndexEntry, VectorIndex, INDEX_FILE};
