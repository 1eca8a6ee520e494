// src/services/vector_index.rs
//! Pinecone data-plane client.
//!
//! Only the `/query` call is needed here. Documents get into the index through
//! a separate ingestion job that stores each chunk's text under the `text`
//! metadata key.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{ApiKey, PineconeConfig};
use crate::error::{Service, UpstreamError};

/// Metadata key holding the snippet text.
pub const TEXT_METADATA_KEY: &str = "text";

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Map<String, Value>,
}

impl ScoredMatch {
    pub fn text(&self) -> Option<&str> {
        self.metadata.get(TEXT_METADATA_KEY).and_then(Value::as_str)
    }
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Nearest neighbours of `vector` inside `namespace`.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
    ) -> Result<Vec<ScoredMatch>, UpstreamError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    namespace: &'a str,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone)]
pub struct PineconeIndex {
    http: Client,
    api_key: ApiKey,
    query_url: String,
}

impl PineconeIndex {
    pub fn new(http: Client, config: &PineconeConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            query_url: format!("{}/query", config.index_host),
        }
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
    ) -> Result<Vec<ScoredMatch>, UpstreamError> {
        let body = QueryRequest {
            vector,
            top_k,
            namespace,
            include_metadata: true,
            include_values: false,
        };

        let response = self
            .http
            .post(&self.query_url)
            .header("Api-Key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(Service::VectorIndex, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { service: Service::VectorIndex, status, body });
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::malformed(Service::VectorIndex, e.to_string()))?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| ScoredMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata.unwrap_or_default(),
            })
            .collect())
    }
}
