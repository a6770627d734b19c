//! Answer generation: hosted LLM client, prompts, keyword fallback

mod client;
mod fallback;
mod prompt;

pub use client::LlmClient;
pub use fallback::{FallbackAnswer, KeywordFallback, MISS_ANSWER};
pub use prompt::{PromptBuilder, SYSTEM_PROMPT};

use async_trait::async_trait;

use crate::error::Result;

/// Trait for generating answer text
///
/// Implementations:
/// - `LlmClient`: hosted OpenAI-compatible chat completions endpoint
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate answer text from a system instruction and a user prompt.
    async fn generate(&self, system: &str, user: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
