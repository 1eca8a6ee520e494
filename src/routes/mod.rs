// src/routes/mod.rs
pub mod chat;

use std::any::Any;

use crate::{error::AppError, state::SharedState};
use axum::{
    Router,
    http::HeaderValue,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chat::chat_handler;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub fn create_router() -> Router<SharedState> {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/health", get(|| async { "OK" }))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

/// `*` anywhere in the list opens CORS to every origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(cors::Any).allow_headers(cors::Any);

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(cors::Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(parsed)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };

    AppError::Internal(detail).into_response()
}
