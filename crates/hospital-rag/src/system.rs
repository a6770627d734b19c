//! Query orchestration and lifecycle
//!
//! Owns the one-time initialization sequence (select provider → load corpus
//! → build or load index → ready) and composes retrieval, synthesis, and
//! confidence scoring into a single `query` call that never fails past this
//! boundary.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::confidence;
use crate::config::HospitalConfig;
use crate::corpus;
use crate::embeddings::{self, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::generation::{
    FallbackAnswer, GenerationProvider, KeywordFallback, LlmClient, PromptBuilder, SYSTEM_PROMPT,
};
use crate::index::{corpus_hash, IndexBuilder, VectorIndex};
use crate::retrieval::Retriever;
use crate::types::{QueryResult, ScoredChunk};

/// Lifecycle state of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// Which synthesis path produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerPath {
    /// The generative model produced the answer.
    Model,
    /// Generation failed and the keyword table matched.
    KeywordHit,
    /// Generation failed and nothing matched.
    KeywordMiss,
}

/// Answer returned for an empty question, before anything else runs.
pub const EMPTY_QUESTION_ANSWER: &str = "질문을 입력해 주세요.";

/// Answer returned while the pipeline is in the `Failed` state.
pub const FAILED_STATE_ANSWER: &str =
    "시스템이 초기화되지 않아 답변을 드릴 수 없습니다. 잠시 후 다시 시도해 주세요.";

/// The question-answering orchestrator.
///
/// Constructed explicitly and owned by the caller; there is no process-wide
/// instance. Initialization is single-flight: concurrent first callers
/// coordinate so the index is built exactly once.
pub struct HospitalQa {
    config: HospitalConfig,
    generator: Arc<dyn GenerationProvider>,
    /// Embedder supplied at construction; when `None` the provider is
    /// selected during initialization (hosted first, local fallback).
    embedder_override: Option<Arc<dyn EmbeddingProvider>>,
    state: RwLock<SystemState>,
    retriever: RwLock<Option<Arc<Retriever>>>,
    init_guard: Mutex<()>,
}

impl HospitalQa {
    /// Create an orchestrator with the default hosted providers.
    pub fn new(config: HospitalConfig) -> Result<Self> {
        config.validate()?;
        let generator: Arc<dyn GenerationProvider> = Arc::new(LlmClient::from_config(&config)?);
        Ok(Self::with_providers(config, None, generator))
    }

    /// Create an orchestrator with explicit providers. Used by tests and by
    /// callers that manage provider construction themselves.
    pub fn with_providers(
        config: HospitalConfig,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            config,
            generator,
            embedder_override: embedder,
            state: RwLock::new(SystemState::Uninitialized),
            retriever: RwLock::new(None),
            init_guard: Mutex::new(()),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SystemState {
        *self.state.read()
    }

    /// The active configuration.
    pub fn config(&self) -> &HospitalConfig {
        &self.config
    }

    /// Number of chunks in the ready index, if initialized.
    pub fn chunk_count(&self) -> Option<usize> {
        self.retriever.read().as_ref().map(|r| r.index().len())
    }

    /// Run the one-time initialization sequence.
    ///
    /// Concurrent callers serialize on an internal guard: the first one
    /// performs the build, the rest wait and observe its outcome. A caller
    /// that already saw `Failed` before calling is treated as an explicit
    /// retry and runs the sequence again; a caller that was merely waiting
    /// out another caller's attempt gets that attempt's failure instead of
    /// triggering a second build.
    pub async fn initialize(&self) -> Result<()> {
        let observed = self.state();
        let _guard = self.init_guard.lock().await;

        match self.state() {
            SystemState::Ready => return Ok(()),
            SystemState::Failed if observed != SystemState::Failed => {
                return Err(Error::index_build(
                    "initialization failed in a concurrent caller; call initialize() again to retry",
                ));
            }
            _ => {}
        }

        *self.state.write() = SystemState::Initializing;
        tracing::info!("initializing question-answering pipeline");

        match self.initialize_inner().await {
            Ok(retriever) => {
                *self.retriever.write() = Some(Arc::new(retriever));
                *self.state.write() = SystemState::Ready;
                tracing::info!("pipeline ready");
                Ok(())
            }
            Err(e) => {
                *self.state.write() = SystemState::Failed;
                tracing::error!("initialization failed: {}", e);
                Err(e)
            }
        }
    }

    async fn initialize_inner(&self) -> Result<Retriever> {
        // 1. Embedding provider, fixed for everything that follows.
        let embedder = match &self.embedder_override {
            Some(provider) => Arc::clone(provider),
            None => embeddings::select_provider(&self.config).await?,
        };

        // 2. Processed corpus.
        let units = corpus::load_units(&self.config.data.corpus_path)?;
        if units.is_empty() {
            return Err(Error::data_load("processed corpus is empty"));
        }

        // 3. Index: reuse the persisted build when it still matches the
        // corpus and the selected provider, otherwise rebuild and replace.
        let dir = &self.config.data.vectorstore_path;
        let hash = corpus_hash(&units);
        if let Ok(existing) = VectorIndex::load(dir) {
            if existing.corpus_hash == hash
                && existing.provider == embedder.name()
                && existing.dimensions == embedder.dimensions()
            {
                tracing::info!("loaded persisted index ({} chunks)", existing.len());
                return Ok(Retriever::new(embedder, Arc::new(existing)));
            }
            tracing::info!("persisted index is stale, rebuilding");
        }

        let builder = IndexBuilder::new(&self.config, Arc::clone(&embedder));
        let built = builder.build(&units).await?;
        built.save(dir)?;
        Ok(Retriever::new(embedder, Arc::new(built)))
    }

    /// Answer one question.
    ///
    /// Never returns an error: every failure mode resolves to a
    /// `QueryResult` with an explanatory answer and low confidence. The
    /// first call triggers initialization; a failed pipeline answers with a
    /// fixed apology until the caller explicitly re-initializes.
    pub async fn query(&self, question: &str) -> QueryResult {
        // Validation runs before anything that could touch the network.
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return QueryResult {
                question: question.to_string(),
                answer: EMPTY_QUESTION_ANSWER.to_string(),
                confidence: confidence::NONE,
                sources: Vec::new(),
            };
        }

        match self.state() {
            SystemState::Uninitialized | SystemState::Initializing => {
                // First caller initializes; waiters pick up the outcome.
                if let Err(e) = self.initialize().await {
                    tracing::warn!("query arrived while initialization failed: {}", e);
                }
            }
            _ => {}
        }

        let retriever = self.retriever.read().as_ref().map(Arc::clone);
        let retriever = match (self.state(), retriever) {
            (SystemState::Ready, Some(retriever)) => retriever,
            _ => {
                return QueryResult {
                    question: trimmed.to_string(),
                    answer: FAILED_STATE_ANSWER.to_string(),
                    confidence: confidence::NONE,
                    sources: Vec::new(),
                };
            }
        };

        let top_k = self.config.rag.top_k;
        let retrieved = match retriever.search(trimmed, top_k).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("retrieval failed, answering without context: {}", e);
                Vec::new()
            }
        };

        let (answer, path) = self.synthesize(trimmed, &retrieved).await;
        let confidence = match path {
            AnswerPath::Model => confidence::coverage(retrieved.len(), top_k),
            AnswerPath::KeywordHit => confidence::KEYWORD_HIT,
            AnswerPath::KeywordMiss => confidence::KEYWORD_MISS,
        };

        QueryResult {
            question: trimmed.to_string(),
            answer,
            confidence,
            sources: retrieved,
        }
    }

    /// Answer without retrieval context (the direct generation path).
    ///
    /// Does not require initialization; only the generative provider and
    /// its keyword fallback are involved.
    pub async fn query_direct(&self, question: &str) -> QueryResult {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return QueryResult {
                question: question.to_string(),
                answer: EMPTY_QUESTION_ANSWER.to_string(),
                confidence: confidence::NONE,
                sources: Vec::new(),
            };
        }

        let (answer, path) = self.synthesize(trimmed, &[]).await;
        let confidence = match path {
            AnswerPath::Model => confidence::MODEL_DIRECT,
            AnswerPath::KeywordHit => confidence::KEYWORD_HIT,
            AnswerPath::KeywordMiss => confidence::KEYWORD_MISS,
        };

        QueryResult {
            question: trimmed.to_string(),
            answer,
            confidence,
            sources: Vec::new(),
        }
    }

    /// Generate an answer, degrading to the keyword table when the
    /// generative call fails. Synthesis failure never propagates; it only
    /// lowers confidence.
    async fn synthesize(&self, question: &str, retrieved: &[ScoredChunk]) -> (String, AnswerPath) {
        let user_prompt = PromptBuilder::build_user_prompt(question, retrieved);
        match self.generator.generate(SYSTEM_PROMPT, &user_prompt).await {
            Ok(answer) => (answer, AnswerPath::Model),
            Err(e) => {
                tracing::warn!("generation failed, using keyword fallback: {}", e);
                match KeywordFallback::answer(question) {
                    FallbackAnswer::Hit(answer) => (answer, AnswerPath::KeywordHit),
                    FallbackAnswer::Miss(answer) => (answer, AnswerPath::KeywordMiss),
                }
            }
        }
    }
}
