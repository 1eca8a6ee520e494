// src/services/completion.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ApiKey, OpenRouterConfig};
use crate::error::{Service, UpstreamError};

/// One system + one user turn in, generated text out. No streaming, no history.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, UpstreamError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenRouter `/chat/completions` client.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: Client,
    api_key: ApiKey,
    url: String,
    model: String,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    pub fn new(http: Client, config: &OpenRouterConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            url: format!("{}/chat/completions", config.base_url),
            model: config.model.clone(),
            referer: config.referer.clone(),
            title: config.title.clone(),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, UpstreamError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(self.api_key.expose())
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&request)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(Service::Completion, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { service: Service::Completion, status, body });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::malformed(Service::Completion, e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::malformed(Service::Completion, "no choices in response"))?;
        let text = choice.message.content.ok_or_else(|| {
            UpstreamError::malformed(Service::Completion, "first choice has no message content")
        })?;

        debug!(model = %self.model, bytes = text.len(), "completion received");
        Ok(text)
    }
}
