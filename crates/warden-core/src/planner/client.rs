//! Client - Chat completion transport for the model-backed planner
//!
//! Any endpoint speaking the `/v1/chat/completions` dialect works: OpenAI,
//! Ollama, llama.cpp, vLLM. Only the text of the first choice is used.

use crate::error::{Error, Result};
use crate::model::Role;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default base URL (a local Ollama)
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "llama3.2";

/// One message sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMessage {
    /// `system`, `user` or `assistant`
    pub role: String,
    /// Message text
    pub content: String,
}

impl CompletionMessage {
    /// Create a message
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role: role.as_str().to_string(),
            content: content.into(),
        }
    }
}

/// Source of model completions
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete a conversation, returning the assistant's text
    async fn complete(&self, messages: &[CompletionMessage]) -> Result<String>;

    /// Model identifier (for logging)
    fn model(&self) -> &str;
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [CompletionMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Keep provider error text short and free of local paths
fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();
    if lower.contains("/home") || lower.contains("/root") || lower.contains("/var") {
        return "the model endpoint reported an internal error".to_string();
    }
    if error.len() < 100 {
        return error.to_string();
    }
    "the model endpoint returned an error".to_string()
}

// ============================================================================
// Client Implementation
// ============================================================================

/// OpenAI-compatible endpoint configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL including the version segment (default: local Ollama)
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Bearer token, if the endpoint needs one
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }
}

impl OpenAiConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for `/v1/chat/completions` endpoints
pub struct OpenAiCompatibleClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiCompatibleClient {
    /// Create a new client
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Planning(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// The endpoint configuration
    #[must_use]
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiCompatibleClient {
    async fn complete(&self, messages: &[CompletionMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: 0.0,
            stream: false,
        };

        debug!(model = %self.config.model, messages = messages.len(), "Sending completion request");

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                Error::Planning(format!(
                    "failed to connect to the model endpoint at {}",
                    self.config.base_url
                ))
            } else if e.is_timeout() {
                Error::Planning(format!(
                    "the model endpoint timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            } else {
                Error::Planning(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Planning(e.to_string()))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorBody>(&body) {
                return Err(Error::Planning(sanitize_api_error(&error.error.message)));
            }
            return Err(Error::Planning(sanitize_api_error(&format!("HTTP {}", status))));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Planning(format!("unreadable completion response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Planning("completion response had no content".to_string()))
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
