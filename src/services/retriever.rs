// src/services/retriever.rs
use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, warn};

use super::embeddings::Embedder;
use super::vector_index::VectorIndex;
use crate::error::UpstreamError;

/// How many snippets every query asks the index for.
pub const TOP_K: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedSnippet {
    pub text: String,
    pub score: f32,
}

/// Embeds the guest's question and pulls the closest hotel-knowledge snippets.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    namespace: String,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        namespace: impl Into<String>,
    ) -> Self {
        Self { embedder, index, namespace: namespace.into() }
    }

    /// Up to [`TOP_K`] snippets, most similar first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedSnippet>, UpstreamError> {
        let vector = self.embedder.embed(query).await?;
        let mut matches = self.index.query(&vector, TOP_K, &self.namespace).await?;

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        matches.truncate(TOP_K);

        let snippets: Vec<RetrievedSnippet> = matches
            .into_iter()
            .filter_map(|m| match m.text() {
                Some(text) => Some(RetrievedSnippet { text: text.to_string(), score: m.score }),
                None => {
                    warn!(id = %m.id, namespace = %self.namespace, "match has no text metadata, skipping");
                    None
                }
            })
            .collect();

        debug!(
            count = snippets.len(),
            scores = ?snippets.iter().map(|s| s.score).collect::<Vec<_>>(),
            "snippets retrieved"
        );
        Ok(snippets)
    }
}
