// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::completion::OpenRouterClient;
use crate::services::embeddings::OpenAiEmbedder;
use crate::services::responder::Responder;
use crate::services::retriever::Retriever;
use crate::services::vector_index::PineconeIndex;

pub type SharedState = Arc<AppState>;

/// Built once at startup and handed to every request. Nothing in here is mutated.
#[derive(Debug, Clone)]
pub struct AppState {
    pub retriever: Retriever,
    pub responder: Responder,
}

impl AppState {
    pub fn new(retriever: Retriever, responder: Responder) -> Self {
        Self { retriever, responder }
    }

    /// Wire the real upstream clients. All of them share one connection pool.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(APP_USER_AGENT);
        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let embedder = OpenAiEmbedder::new(http.clone(), &config.embeddings);
        let index = PineconeIndex::new(http.clone(), &config.pinecone);
        let completion = OpenRouterClient::new(http, &config.openrouter);

        let retriever = Retriever::new(
            Arc::new(embedder),
            Arc::new(index),
            config.pinecone.namespace.clone(),
        );
        let responder = Responder::new(Arc::new(completion), config.openrouter.system_prompt.clone());

        Ok(Self::new(retriever, responder))
    }
}

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
