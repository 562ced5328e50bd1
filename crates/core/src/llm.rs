use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.1-8b-instant";

/// Retries after the initial attempt; the call never hangs indefinitely.
const MAX_RETRIES: u32 = 2;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The hosted chat-completion collaborator: prompt text in, answer text out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, PipelineError>;
}

/// Chat-completion client for the Groq OpenAI-compatible API.
///
/// Temperature is pinned to 0.0 for factual answers, and failures are
/// retried a bounded number of times before surfacing as
/// [`PipelineError::Generation`].
pub struct GroqChatModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GroqChatModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, PipelineError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PipelineError::Generation {
                attempts: 0,
                details: "chat model API key must not be empty".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| PipelineError::Generation {
                attempts: 0,
                details: format!("failed to build http client: {error}"),
            })?;

        Ok(Self {
            client,
            endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            model: model.into(),
            api_key,
        })
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self, PipelineError> {
        let api_key = std::env::var("GROQ_API_KEY").map_err(|_| PipelineError::Generation {
            attempts: 0,
            details: "GROQ_API_KEY environment variable not set".to_string(),
        })?;
        Self::new(api_key, model)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn send_once(&self, system: &str, user: &str) -> Result<String, SendFailure> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|error| SendFailure::Retryable(format!("request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&raw)
                .map(|parsed| parsed.error.message)
                .unwrap_or(raw);
            let details = format!("API returned {status}: {detail}");
            // Only rate limits and server-side failures are retried.
            return if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                || status.is_server_error()
            {
                Err(SendFailure::Retryable(details))
            } else {
                Err(SendFailure::Fatal(details))
            };
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|error| SendFailure::Fatal(format!("failed to parse response: {error}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| SendFailure::Fatal("API response had no choices".to_string()))
    }
}

/// A failed attempt, classified for the retry loop.
enum SendFailure {
    Retryable(String),
    Fatal(String),
}

#[async_trait]
impl ChatModel for GroqChatModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, PipelineError> {
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            debug!(model = %self.model, attempt = attempts, "chat completion request");

            match self.send_once(system, user).await {
                Ok(answer) => {
                    if answer.trim().is_empty() {
                        return Err(PipelineError::EmptyCompletion);
                    }
                    return Ok(answer);
                }
                Err(SendFailure::Retryable(details)) if attempts <= MAX_RETRIES => {
                    warn!(attempt = attempts, %details, "chat completion failed, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempts).await;
                }
                Err(SendFailure::Retryable(details)) | Err(SendFailure::Fatal(details)) => {
                    return Err(PipelineError::Generation { attempts, details });
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}
