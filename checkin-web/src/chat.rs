//! Chat assistant backed by an OpenAI-compatible completions API
//!
//! The kiosk pages embed a small chat widget that posts to `/api/chat`.
//! Each message is sent as a single completion request with a fixed system
//! prompt. There is no conversation memory and no retry.

use crate::config::ChatConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant for a student check-in system. Keep responses concise and helpful.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("API response contained no message")]
    EmptyResponse,
}

/// Something that can answer a single chat message
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String, ChatError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI chat completions client
pub struct OpenAiChat {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(api_key: String, config: &ChatConfig) -> Result<Self, ChatError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }

    /// Builds a client when the configuration carries an API key
    pub fn from_config(config: &ChatConfig) -> Result<Option<Self>, ChatError> {
        config
            .api_key
            .clone()
            .map(|key| Self::new(key, config))
            .transpose()
    }
}

fn first_reply(body: CompletionResponse) -> Result<String, ChatError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or(ChatError::EmptyResponse)
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    #[instrument(skip(self, message), fields(message_len = message.len(), model = %self.model))]
    async fn reply(&self, message: &str) -> Result<String, ChatError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: message,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Chat API returned an error");
            return Err(ChatError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: CompletionResponse = response.json().await?;
        let reply = first_reply(body)?;
        debug!(reply_len = reply.len(), "Chat reply received");
        Ok(reply)
    }
}
