//! Text-generation service client.
//!
//! Every tool gets its generator handed in at registration, so tests swap in
//! a fake without touching tool logic.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const BODY_EXCERPT_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text generation is not configured: {0}")]
    NotConfigured(String),

    #[error("generation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation service returned an unreadable body: {0}")]
    InvalidResponse(String),

    #[error("generation service returned no content")]
    EmptyResponse,
}

/// Prompt in, full text out. One blocking round trip, no retries.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, system: Option<&str>, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct AzureSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: Option<String>,
    pub api_version: String,
    pub timeout: Duration,
}

/// Azure OpenAI chat-completions deployment.
pub struct AzureChatClient {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl AzureChatClient {
    pub fn new(settings: &AzureSettings) -> Result<Self, GenerationError> {
        let endpoint = required(&settings.endpoint, "AZURE_OPENAI_ENDPOINT")?;
        let api_key = required(&settings.api_key, "AZURE_OPENAI_API_KEY")?;
        let deployment = required(&settings.deployment, "AZURE_OPENAI_DEPLOYMENT")?;

        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(GenerationError::Transport)?;

        Ok(Self {
            client,
            url: chat_completions_url(endpoint, deployment, &settings.api_version),
            api_key: api_key.to_string(),
            timeout: settings.timeout,
        })
    }
}

impl TextGenerator for AzureChatClient {
    fn generate(&self, system: Option<&str>, prompt: &str) -> Result<String, GenerationError> {
        let body = ChatRequest::new(system, prompt);
        debug!(url = %self.url, prompt_chars = prompt.len(), "sending generation request");

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|err| self.map_transport(err))?;

        let status = response.status();
        let text = response.text().map_err(|err| self.map_transport(err))?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: excerpt(&text),
            });
        }

        extract_content(&text)
    }
}

impl AzureChatClient {
    fn map_transport(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout)
        } else {
            GenerationError::Transport(err)
        }
    }
}

impl std::fmt::Debug for AzureChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureChatClient")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Stand-in used when the service settings are incomplete, so the server
/// still starts and each tool degrades to its error envelope.
#[derive(Debug)]
pub struct UnavailableGenerator {
    reason: String,
}

impl UnavailableGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl TextGenerator for UnavailableGenerator {
    fn generate(&self, _system: Option<&str>, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::NotConfigured(self.reason.clone()))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
}

impl<'a> ChatRequest<'a> {
    fn new(system: Option<&'a str>, prompt: &'a str) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });
        Self { messages }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, GenerationError> {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(GenerationError::NotConfigured(format!("{name} is not set"))),
    }
}

fn chat_completions_url(endpoint: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
        endpoint.trim_end_matches('/')
    )
}

fn extract_content(body: &str) -> Result<String, GenerationError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|err| GenerationError::InvalidResponse(err.to_string()))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        Err(GenerationError::EmptyResponse)
    } else {
        Ok(content)
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(BODY_EXCERPT_CHARS).collect()
}
