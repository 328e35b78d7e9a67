//! NLU (chat completion) client
//!
//! The classifier only depends on [`CompletionClient`]; [`OpenAiClient`] talks
//! to any OpenAI-compatible `/chat/completions` endpoint.

use async_trait::async_trait;
use bau_common::config::NluConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

const USER_AGENT: &str = concat!("bau-voice/", env!("CARGO_PKG_VERSION"));

/// Shared, runtime-replaceable API key
///
/// The settings endpoint writes it; the client reads it per request.
pub type ApiKeyHandle = Arc<RwLock<Option<String>>>;

pub fn api_key_handle(key: Option<String>) -> ApiKeyHandle {
    Arc::new(RwLock::new(key))
}

/// NLU client errors
#[derive(Debug, Error)]
pub enum NluError {
    #[error("NLU service not configured: no API key")]
    NotConfigured,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Instruction, example output shape and transcript sent to the NLU service
#[derive(Debug, Clone)]
pub struct Prompt {
    pub instructions: String,
    pub example_schema: serde_json::Value,
    pub transcript: String,
}

impl Prompt {
    /// Render as a single user message
    pub fn render(&self) -> String {
        let example = serde_json::to_string_pretty(&self.example_schema)
            .unwrap_or_else(|_| self.example_schema.to_string());

        format!(
            "{}\n\nAntworte ausschließlich mit einem JSON-Objekt in diesem Format:\n{}\n\n\
             Sprachbefehl: \"{}\"",
            self.instructions, example, self.transcript
        )
    }
}

/// Text completion service used by the classifier
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Whether a credential is available
    async fn is_configured(&self) -> bool;

    /// Send the prompt and return the raw reply text
    async fn complete(&self, prompt: &Prompt) -> Result<String, NluError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// OpenAI-compatible chat completion client
pub struct OpenAiClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: ApiKeyHandle,
}

impl OpenAiClient {
    pub fn new(config: &NluConfig, api_key: ApiKeyHandle) -> Result<Self, NluError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NluError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    async fn current_key(&self) -> Option<String> {
        self.api_key
            .read()
            .await
            .clone()
            .filter(|key| crate::config::is_valid_key(key))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn is_configured(&self) -> bool {
        self.current_key().await.is_some()
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, NluError> {
        let api_key = self.current_key().await.ok_or(NluError::NotConfigured)?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.render()),
            }],
            temperature: 0.1,
        };

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "Querying NLU service");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NluError::NetworkError(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NluError::ApiError(status.as_u16(), error_text));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| NluError::ParseError(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| NluError::ParseError("Reply has no message content".to_string()))?;

        tracing::debug!(reply_len = content.len(), "NLU reply received");

        Ok(content)
    }
}
