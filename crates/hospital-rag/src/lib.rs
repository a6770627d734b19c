//! hospital-rag: customer-support question answering for a hospital
//!
//! Ingests prior question/answer pairs from delimited text, indexes them in
//! a similarity-searchable vector store, and answers free-text questions
//! with a generated answer, a confidence score, and source references.
//! Generation degrades to a fixed keyword table when the hosted model is
//! unreachable, so a query never fails outright.

pub mod confidence;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod index;
pub mod retrieval;
pub mod system;
pub mod types;

pub use config::HospitalConfig;
pub use error::{Error, Result};
pub use system::{HospitalQa, SystemState};
pub use types::{Chunk, QaUnit, QueryResult, ScoredChunk};
