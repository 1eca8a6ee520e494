// src/services/responder.rs
use std::sync::Arc;

use tracing::debug;

use super::completion::CompletionClient;
use super::prompt::build_prompt;
use super::retriever::RetrievedSnippet;
use crate::error::UpstreamError;
use crate::message::GuestContext;

/// Wraps the completion API with the concierge persona.
#[derive(Clone)]
pub struct Responder {
    completion: Arc<dyn CompletionClient>,
    system_prompt: String,
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

impl Responder {
    pub fn new(completion: Arc<dyn CompletionClient>, system_prompt: impl Into<String>) -> Self {
        Self { completion, system_prompt: system_prompt.into() }
    }

    pub async fn respond(
        &self,
        message: &str,
        guest: Option<&GuestContext>,
        snippets: &[RetrievedSnippet],
    ) -> Result<String, UpstreamError> {
        let prompt = build_prompt(message, guest, snippets);
        debug!(prompt_chars = prompt.len(), has_guest = guest.is_some(), "prompt built");

        self.completion.complete(&self.system_prompt, &prompt).await
    }
}
