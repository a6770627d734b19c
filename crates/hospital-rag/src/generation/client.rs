//! Hosted LLM client with retry and bounded output

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{HospitalConfig, API_KEY_VAR};
use crate::error::{Error, Result};

use super::GenerationProvider;

/// Client for an OpenAI-compatible `/chat/completions` endpoint with
/// automatic retry.
pub struct LlmClient {
    client: Client,
    base_url: String,
    /// Read once at construction; `None` means every call short-circuits
    /// before dialing.
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl LlmClient {
    /// Create a client from configuration. A missing API key does not fail
    /// construction; it is detected before any network call instead.
    pub fn from_config(config: &HospitalConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .build()?;

        let api_key = std::env::var(API_KEY_VAR).ok();
        if api_key.is_none() {
            tracing::warn!(
                "{} is not set; generation will fall back to the keyword table",
                API_KEY_VAR
            );
        }

        Ok(Self {
            client,
            base_url: config.llm.base_url.clone(),
            api_key,
            model: config.model.llm_model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.rag.max_tokens,
            max_retries: config.llm.max_retries,
        })
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "generation request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::synthesis("unknown error")))
    }
}

#[async_trait]
impl GenerationProvider for LlmClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| Error::Synthesis(format!("{} is not set", API_KEY_VAR)))?;

        let url = format!("{}/chat/completions", self.base_url);
        let model = self.model.clone();
        let system = system.to_string();
        let user = user.to_string();
        let temperature = self.temperature;
        let max_tokens = self.max_tokens;
        let client = self.client.clone();

        tracing::debug!("generating answer with model {}", model);

        self.retry_request(|| {
            let url = url.clone();
            let api_key = api_key.clone();
            let model = model.clone();
            let system = system.clone();
            let user = user.clone();
            let client = client.clone();

            async move {
                let request = ChatRequest {
                    model: &model,
                    messages: vec![
                        ChatMessage {
                            role: "system",
                            content: &system,
                        },
                        ChatMessage {
                            role: "user",
                            content: &user,
                        },
                    ],
                    temperature,
                    max_tokens,
                };

                let response = client
                    .post(&url)
                    .bearer_auth(&api_key)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::Synthesis(format!("generation request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::Synthesis(format!(
                        "generation failed: HTTP {} - {}",
                        status, body
                    )));
                }

                let parsed: ChatResponse = response.json().await.map_err(|e| {
                    Error::Synthesis(format!("failed to parse generation response: {}", e))
                })?;

                parsed
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| choice.message.content)
                    .ok_or_else(|| Error::synthesis("empty generation response"))
            }
        })
        .await
    }

    fn name(&self) -> &str {
        "openai"
    }
}
