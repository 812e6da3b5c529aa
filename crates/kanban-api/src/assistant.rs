//! The AI chat collaborator.
//!
//! [`Assistant::respond`] never fails: missing credentials, transport errors
//! and malformed model output all come back as a plain message with no board
//! update.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use kanban_types::api::ChatMessage;
use kanban_types::board::BoardDocument;

pub const NOT_CONFIGURED_MESSAGE: &str =
    "AI is not configured. Please set OPENROUTER_API_KEY in your .env file.";
pub const FALLBACK_MESSAGE: &str =
    "I encountered an error processing my response. Please try again.";

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-120b";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub board_update: Option<BoardDocument>,
}

impl AssistantReply {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            board_update: None,
        }
    }
}

#[async_trait]
pub trait Assistant: Send + Sync {
    async fn respond(&self, board: &BoardDocument, messages: &[ChatMessage]) -> AssistantReply;
}

#[derive(Debug, Error)]
enum AssistantError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response had no message content")]
    EmptyContent,

    #[error("failed to encode board: {0}")]
    Encode(#[from] serde_json::Error),
}

// -- OpenAI-compatible chat completion wire types --

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionContent,
}

#[derive(Deserialize)]
struct CompletionContent {
    content: Option<String>,
}

/// Chat-completions client for OpenRouter (or any OpenAI-compatible endpoint).
pub struct OpenRouterAssistant {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenRouterAssistant {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn complete(&self, board: &BoardDocument, messages: &[ChatMessage]) -> Result<String, AssistantError> {
        let system_prompt = system_prompt(board)?;

        let mut wire_messages = Vec::with_capacity(messages.len() + 1);
        wire_messages.push(CompletionMessage {
            role: "system",
            content: &system_prompt,
        });
        wire_messages.extend(messages.iter().map(|m| CompletionMessage {
            role: &m.role,
            content: &m.content,
        }));

        let body = CompletionRequest {
            model: &self.model,
            messages: wire_messages,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AssistantError::EmptyContent)
    }
}

#[async_trait]
impl Assistant for OpenRouterAssistant {
    async fn respond(&self, board: &BoardDocument, messages: &[ChatMessage]) -> AssistantReply {
        if !self.is_configured() {
            error!("OPENROUTER_API_KEY is not configured");
            return AssistantReply::text(NOT_CONFIGURED_MESSAGE);
        }

        match self.complete(board, messages).await {
            Ok(content) => parse_reply(&content),
            Err(e) => {
                error!("Assistant call failed: {}", e);
                AssistantReply::text(FALLBACK_MESSAGE)
            }
        }
    }
}

impl std::fmt::Debug for OpenRouterAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterAssistant")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

fn system_prompt(board: &BoardDocument) -> Result<String, serde_json::Error> {
    let board_json = serde_json::to_string(board)?;
    Ok(format!(
        "You are an AI assistant helping manage a Kanban board. \
         The current board state is provided as JSON below.\n\n\
         Board: {board_json}\n\n\
         Respond with a JSON object containing:\n  \
         \"message\": a string response to the user\n  \
         \"board_update\": an updated board object with the same shape if changes are needed, or null\n\
         Return only valid JSON."
    ))
}

/// Interpret raw model output. Anything that is not a JSON object of the
/// expected shape becomes the fallback reply.
pub fn parse_reply(content: &str) -> AssistantReply {
    match serde_json::from_str::<AssistantReply>(content) {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Assistant response was not valid JSON: {}", e);
            AssistantReply::text(FALLBACK_MESSAGE)
        }
    }
}
