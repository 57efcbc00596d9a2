/// LLM Client: the single point of entry for all Claude API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Pipeline code depends on the `TextCompletion` trait, never on `LlmClient`.
///
/// Model: claude-sonnet-4-5 (hardcoded, do not make configurable)
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 8192;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a multi-turn exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Prompt-in / text-out completion capability.
///
/// `converse` receives the whole turn history; implementations are stateless,
/// so conversation state lives in `ChatSession`.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    async fn converse(&self, turns: &[ChatTurn]) -> Result<String, LlmError>;
}

/// An image passed to a vision completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub media_type: String,
    pub data: Vec<u8>,
}

/// Prompt plus images in, text out.
#[async_trait]
pub trait VisionCompletion: Send + Sync {
    async fn complete_with_images(
        &self,
        prompt: &str,
        images: &[ImageAttachment],
    ) -> Result<String, LlmError>;
}

/// A stateful conversation over any `TextCompletion`.
pub struct ChatSession<'a> {
    llm: &'a dyn TextCompletion,
    turns: Vec<ChatTurn>,
}

impl<'a> ChatSession<'a> {
    pub fn new(llm: &'a dyn TextCompletion) -> Self {
        Self {
            llm,
            turns: Vec::new(),
        }
    }

    /// Sends one user turn and records the reply. A failed call leaves the
    /// history as it was before the call.
    pub async fn send(&mut self, prompt: impl Into<String>) -> Result<String, LlmError> {
        self.turns.push(ChatTurn::user(prompt));
        match self.llm.converse(&self.turns).await {
            Ok(reply) => {
                self.turns.push(ChatTurn::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.turns.pop();
                Err(e)
            }
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a, M: Serialize> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [M],
}

/// A user message made of content blocks, used for image input.
#[derive(Debug, Serialize)]
struct BlockMessage {
    role: Role,
    content: Vec<RequestBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RequestBlock {
    Image { source: ImageSource },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

impl BlockMessage {
    fn user_with_images(prompt: &str, images: &[ImageAttachment]) -> Self {
        let mut content: Vec<RequestBlock> = images
            .iter()
            .map(|image| RequestBlock::Image {
                source: ImageSource {
                    source_type: "base64",
                    media_type: image.media_type.clone(),
                    data: STANDARD.encode(&image.data),
                },
            })
            .collect();
        content.push(RequestBlock::Text {
            text: prompt.to_string(),
        });
        Self {
            role: Role::User,
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The production completion backend.
/// Wraps the Anthropic Messages API with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call<M: Serialize + Sync>(
        &self,
        turns: &[M],
        system: &str,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: turns,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                turns = turns.len(),
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens,
                llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the LLM with a single user turn and returns its text.
    pub async fn call_text(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let turns = [ChatTurn::user(prompt)];
        let response = self.call(&turns, system).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

#[async_trait]
impl TextCompletion for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.call_text(prompt, prompts::ANALYST_SYSTEM).await
    }

    async fn converse(&self, turns: &[ChatTurn]) -> Result<String, LlmError> {
        let response = self.call(turns, prompts::ANALYST_SYSTEM).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

#[async_trait]
impl VisionCompletion for LlmClient {
    async fn complete_with_images(
        &self,
        prompt: &str,
        images: &[ImageAttachment],
    ) -> Result<String, LlmError> {
        let message = [BlockMessage::user_with_images(prompt, images)];
        let response = self.call(&message, prompts::ANALYST_SYSTEM).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Splits a comma-separated completion into trimmed, non-empty items,
/// preserving order and case.
pub fn parse_comma_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
