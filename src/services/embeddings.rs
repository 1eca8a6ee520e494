// src/services/embeddings.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ApiKey, EmbeddingsConfig};
use crate::error::{Service, UpstreamError};

/// Turns text into the vector used as the similarity-search key.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError>;
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

/// OpenAI-compatible `/embeddings` client.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    http: Client,
    api_key: ApiKey,
    url: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(http: Client, config: &EmbeddingsConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            url: format!("{}/embeddings", config.base_url),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(self.api_key.expose())
            .json(&EmbeddingsRequest { input: text, model: &self.model })
            .send()
            .await
            .map_err(|e| UpstreamError::transport(Service::Embeddings, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { service: Service::Embeddings, status, body });
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::malformed(Service::Embeddings, e.to_string()))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| UpstreamError::malformed(Service::Embeddings, "no embedding returned"))?;

        debug!(dimensions = embedding.len(), model = %self.model, "query embedded");
        Ok(embedding)
    }
}
