//! Chat-completion service client.
//!
//! The pipeline talks to the model through the [`CompletionService`] trait so
//! the HTTPS client can be swapped for a scripted double in tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::middleware::request_id::X_REQUEST_ID;
use crate::pipeline::TemplateId;

/// One outbound completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub template: TemplateId,
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Forwarded as `x-request-id` so upstream logs match ours.
    pub request_id: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion service unavailable: {0}")]
    Unavailable(String),

    #[error("no response received from the completion service")]
    EmptyResponse,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send one prompt and return the text of the first choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;

    /// Cheap reachability check.
    async fn health_check(&self) -> Result<(), CompletionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Error body in the OpenAI-compatible format.
#[derive(Debug, Deserialize)]
struct ServiceErrorResponse {
    error: ServiceErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorDetail {
    message: String,
}

/// HTTPS client for an OpenAI-compatible chat-completion API.
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ChatCompletionClient {
    /// Create a client; `base_url` should include the API version prefix.
    pub fn new(base_url: &str, api_key: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = base_url, "Completion client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl CompletionService for ChatCompletionClient {
    #[instrument(skip(self, request), fields(template = %request.template, model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(request.prompt.clone()));

        let body = ChatCompletionRequest {
            model: &request.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(url = %url, prompt_len = request.prompt.len(), "Completion request");

        let mut req = self.client.post(&url).bearer_auth(&self.api_key);
        if let Some(rid) = &request.request_id {
            req = req.header(X_REQUEST_ID, rid);
        }

        let response = req
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Completion request failed");
                CompletionError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ServiceErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("completion service error: {}", status));

            error!(status = %status, message = %message, "Completion service error");
            return Err(CompletionError::Unavailable(message));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse completion response");
            CompletionError::Unavailable(format!("invalid completion response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }

    async fn health_check(&self) -> Result<(), CompletionError> {
        let url = format!("{}/models", self.base_url);

        self.client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map(|_| ())
            .map_err(|e| CompletionError::Unavailable(e.to_string()))
    }
}
