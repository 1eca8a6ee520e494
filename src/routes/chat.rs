use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse},
    state::SharedState,
};

#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    if payload.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }

    let message = payload.message.as_str();
    let guest = payload.guest_context.as_ref().filter(|g| !g.is_empty());
    info!(bytes = message.len(), has_guest = guest.is_some(), "chat request");

    let snippets = state.retriever.retrieve(message).await?;
    let response = state.responder.respond(message, guest, &snippets).await?;

    info!(snippets = snippets.len(), reply_bytes = response.len(), "chat answered");
    Ok(Json(ChatResponse { response }))
}
