//! Real upstream clients against an in-process fake of each provider.

use concierge_backend::config::{ApiKey, Config, EmbeddingsConfig, OpenRouterConfig, PineconeConfig};
use concierge_backend::error::{Service, UpstreamError};
use concierge_backend::message::ChatResponse;
use concierge_backend::routes::create_router;
use concierge_backend::services::completion::{CompletionClient, OpenRouterClient};
use concierge_backend::services::embeddings::{Embedder, OpenAiEmbedder};
use concierge_backend::services::vector_index::{PineconeIndex, VectorIndex};
use concierge_backend::state::AppState;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

type Recorder = Arc<Mutex<Vec<(HeaderMap, Value)>>>;

async fn spawn_fake(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn echo_completion(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let prompt = body["messages"][1]["content"].as_str().unwrap_or_default().to_string();
    rec.lock().unwrap().push((headers, body));
    Json(json!({
        "id": "gen-123",
        "model": "anthropic/claude-3-opus-20240229",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": prompt } }]
    }))
}

async fn pinecone_query(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    rec.lock().unwrap().push((headers, body));
    Json(json!({
        "namespace": "hotel-knowledge",
        "matches": [
            { "id": "policies-0", "score": 0.91, "metadata": { "text": "Check-in: 3:00 PM", "category": "policies" } },
            { "id": "services-0", "score": 0.72, "values": [] }
        ]
    }))
}

async fn openai_embeddings(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    rec.lock().unwrap().push((headers, body));
    Json(json!({
        "object": "list",
        "data": [{ "object": "embedding", "index": 0, "embedding": [0.25, -0.5, 0.125] }],
        "model": "text-embedding-ada-002",
        "usage": { "prompt_tokens": 5, "total_tokens": 5 }
    }))
}

fn fake_provider(rec: Recorder) -> Router {
    Router::new()
        .route("/api/v1/chat/completions", post(echo_completion))
        .route("/v1/embeddings", post(openai_embeddings))
        .route("/index/query", post(pinecone_query))
        .with_state(rec)
}

fn openrouter_config(base_url: String) -> OpenRouterConfig {
    OpenRouterConfig {
        api_key: ApiKey::new("or-test-key"),
        base_url,
        model: "anthropic/claude-3-opus-20240229".into(),
        system_prompt: "You are an AI concierge.".into(),
        referer: "http://localhost:3000".into(),
        title: "Marriott Concierge".into(),
    }
}

#[tokio::test]
async fn openrouter_sends_expected_request() {
    let rec = Recorder::default();
    let base = spawn_fake(fake_provider(rec.clone())).await;
    let client = OpenRouterClient::new(reqwest::Client::new(), &openrouter_config(format!("{base}/api/v1")));

    let reply = client.complete("You are an AI concierge.", "Where is the gym?").await.unwrap();
    assert_eq!(reply, "Where is the gym?");

    let calls = rec.lock().unwrap();
    let (headers, body) = &calls[0];
    assert_eq!(headers["authorization"], "Bearer or-test-key");
    assert_eq!(headers["http-referer"], "http://localhost:3000");
    assert_eq!(headers["x-title"], "Marriott Concierge");
    assert_eq!(body["model"], "anthropic/claude-3-opus-20240229");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "You are an AI concierge.");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert!(body.get("stream").is_none());
}

#[tokio::test]
async fn openrouter_error_status_is_reported() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model overloaded") }),
    );
    let base = spawn_fake(router).await;
    let client = OpenRouterClient::new(reqwest::Client::new(), &openrouter_config(base));

    let err = client.complete("sys", "hi").await.unwrap_err();
    match err {
        UpstreamError::Status { service, status, body } => {
            assert_eq!(service, Service::Completion);
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, "model overloaded");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn openrouter_without_choices_is_malformed() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { Json(json!({ "id": "gen-1", "choices": [] })) }),
    );
    let base = spawn_fake(router).await;
    let client = OpenRouterClient::new(reqwest::Client::new(), &openrouter_config(base));

    let err = client.complete("sys", "hi").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Malformed { service: Service::Completion, .. }));
}

#[tokio::test]
async fn unreachable_upstream_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = OpenRouterClient::new(reqwest::Client::new(), &openrouter_config(format!("http://{addr}")));
    let err = client.complete("sys", "hi").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Transport { service: Service::Completion, .. }));
}

#[tokio::test]
async fn pinecone_query_uses_namespace_and_api_key() {
    let rec = Recorder::default();
    let base = spawn_fake(fake_provider(rec.clone())).await;
    let index = PineconeIndex::new(
        reqwest::Client::new(),
        &PineconeConfig {
            api_key: ApiKey::new("pc-test-key"),
            index_host: format!("{base}/index"),
            namespace: "hotel-knowledge".into(),
        },
    );

    let matches = index.query(&[0.5, 0.25], 3, "hotel-knowledge").await.unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].id, "policies-0");
    assert_eq!(matches[0].text(), Some("Check-in: 3:00 PM"));
    assert_eq!(matches[1].text(), None);

    let calls = rec.lock().unwrap();
    let (headers, body) = &calls[0];
    assert_eq!(headers["api-key"], "pc-test-key");
    assert_eq!(body["topK"], 3);
    assert_eq!(body["namespace"], "hotel-knowledge");
    assert_eq!(body["includeMetadata"], true);
    assert_eq!(body["vector"], json!([0.5, 0.25]));
}

#[tokio::test]
async fn embeddings_returns_first_vector() {
    let rec = Recorder::default();
    let base = spawn_fake(fake_provider(rec.clone())).await;
    let embedder = OpenAiEmbedder::new(
        reqwest::Client::new(),
        &EmbeddingsConfig {
            api_key: ApiKey::new("sk-test"),
            base_url: format!("{base}/v1"),
            model: "text-embedding-ada-002".into(),
        },
    );

    let vector = embedder.embed("pool hours").await.unwrap();
    assert_eq!(vector, vec![0.25, -0.5, 0.125]);

    let calls = rec.lock().unwrap();
    let (headers, body) = &calls[0];
    assert_eq!(headers["authorization"], "Bearer sk-test");
    assert_eq!(body["input"], "pool hours");
    assert_eq!(body["model"], "text-embedding-ada-002");
}

#[tokio::test]
async fn chat_endpoint_end_to_end_against_fakes() {
    let rec = Recorder::default();
    let base = spawn_fake(fake_provider(rec.clone())).await;

    let env: HashMap<&str, String> = HashMap::from([
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("OPENAI_BASE_URL", format!("{base}/v1")),
        ("PINECONE_API_KEY", "pc-test-key".to_string()),
        ("PINECONE_INDEX_HOST", format!("{base}/index")),
        ("OPENROUTER_API_KEY", "or-test-key".to_string()),
        ("OPENROUTER_BASE_URL", format!("{base}/api/v1")),
    ]);
    let config = Config::from_lookup(|key| env.get(key).cloned()).unwrap();
    let state = Arc::new(AppState::from_config(&config).unwrap());
    let app = create_router().with_state(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"message": "When can I check in?", "guest_context": {"name": "Sam"}}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let chat_resp: ChatResponse = serde_json::from_slice(&body_bytes).unwrap();
    assert!(chat_resp.response.contains("Check-in: 3:00 PM"));
    assert!(chat_resp.response.contains("- Name: Sam"));

    // embeddings, query, completion
    assert_eq!(rec.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn openrouter_null_content_is_malformed() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async {
            Json(json!({ "choices": [{ "message": { "role": "assistant", "content": null } }] }))
        }),
    );
    let base = spawn_fake(router).await;
    let client = OpenRouterClient::new(reqwest::Client::new(), &openrouter_config(base));

    let err = client.complete("sys", "hi").await.unwrap_err();
    match err {
        UpstreamError::Malformed { service, reason } => {
            assert_eq!(service, Service::Completion);
            assert_eq!(reason, "first choice has no message content");
        }
        other => panic!("expected malformed error, got {other:?}"),
    }
}

fn embedder_for(base: &str) -> OpenAiEmbedder {
    OpenAiEmbedder::new(
        reqwest::Client::new(),
        &EmbeddingsConfig {
            api_key: ApiKey::new("sk-test"),
            base_url: base.to_string(),
            model: "text-embedding-ada-002".into(),
        },
    )
}

fn index_for(base: &str) -> PineconeIndex {
    PineconeIndex::new(
        reqwest::Client::new(),
        &PineconeConfig {
            api_key: ApiKey::new("pc-test-key"),
            index_host: base.to_string(),
            namespace: "hotel-knowledge".into(),
        },
    )
}

#[tokio::test]
async fn embeddings_error_status_is_reported() {
    let router = Router::new().route(
        "/embeddings",
        post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
    );
    let base = spawn_fake(router).await;

    let err = embedder_for(&base).embed("pool hours").await.unwrap_err();
    match err {
        UpstreamError::Status { service, status, body } => {
            assert_eq!(service, Service::Embeddings);
            assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn embeddings_without_data_is_malformed() {
    let router = Router::new().route(
        "/embeddings",
        post(|| async { Json(json!({ "object": "list", "data": [] })) }),
    );
    let base = spawn_fake(router).await;

    let err = embedder_for(&base).embed("pool hours").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Malformed { service: Service::Embeddings, .. }));
}

#[tokio::test]
async fn embeddings_with_empty_vector_is_malformed() {
    let router = Router::new().route(
        "/embeddings",
        post(|| async { Json(json!({ "data": [{ "index": 0, "embedding": [] }] })) }),
    );
    let base = spawn_fake(router).await;

    let err = embedder_for(&base).embed("pool hours").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Malformed { service: Service::Embeddings, .. }));
}

#[tokio::test]
async fn pinecone_error_status_is_reported() {
    let router = Router::new().route(
        "/query",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "index is not ready") }),
    );
    let base = spawn_fake(router).await;

    let err = index_for(&base).query(&[0.5, 0.25], 3, "hotel-knowledge").await.unwrap_err();
    match err {
        UpstreamError::Status { service, status, body } => {
            assert_eq!(service, Service::VectorIndex);
            assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body, "index is not ready");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn pinecone_unparsable_body_is_malformed() {
    let router = Router::new().route("/query", post(|| async { "not json" }));
    let base = spawn_fake(router).await;

    let err = index_for(&base).query(&[0.5], 3, "hotel-knowledge").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Malformed { service: Service::VectorIndex, .. }));
}
