//! HTTP surface: the three Ollama-compatible routes.

use crate::proxy;
use crate::registry::ModelRegistry;
use crate::translate::ollama_types::{ChatRequest, ErrorResponse, TagsResponse};
use crate::upstream::UpstreamClient;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub client: reqwest::Client,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_running))
        .route("/api/tags", get(handle_tags))
        .route("/api/chat", post(handle_chat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_running() -> &'static str {
    "Ollama is running"
}

async fn handle_tags(State(state): State<Arc<AppState>>) -> Json<TagsResponse> {
    if state.registry.current_snapshot().backends.is_empty() {
        if let Err(e) = state.registry.refresh().await {
            warn!(error = %e, "model scan failed");
        }
    }

    let snapshot = state.registry.current_snapshot();
    Json(TagsResponse {
        models: snapshot.models.clone(),
    })
}

async fn handle_chat(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let chat: ChatRequest = match serde_json::from_slice(&body) {
        Ok(chat) => chat,
        Err(e) => {
            error!(error = %e, "failed to decode chat request");
            let err = ErrorResponse::new(format!("invalid request body: {e}"));
            return (StatusCode::BAD_REQUEST, Json(err)).into_response();
        }
    };

    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        model = %chat.model,
        stream = chat.stream,
        messages = chat.messages.len(),
        "chat request"
    );

    let backend = state.registry.resolve(&chat.model).await;
    let upstream = UpstreamClient::new(state.client.clone(), &backend);

    if chat.stream {
        handle_chat_streaming(&chat, &upstream, request_id).await
    } else {
        handle_chat_non_streaming(&chat, &upstream, request_id).await
    }
}

async fn handle_chat_non_streaming(
    chat: &ChatRequest,
    upstream: &UpstreamClient,
    request_id: Uuid,
) -> Response {
    match proxy::chat_non_streaming(chat, upstream).await {
        Ok(frame) => Json(frame).into_response(),
        Err(e) => {
            error!(%request_id, endpoint = %upstream.endpoint(), error = %e, "chat completion failed");
            let err = ErrorResponse::new(format!("chat completion failed: {e}"));
            (StatusCode::BAD_GATEWAY, Json(err)).into_response()
        }
    }
}

async fn handle_chat_streaming(
    chat: &ChatRequest,
    upstream: &UpstreamClient,
    request_id: Uuid,
) -> Response {
    match proxy::chat_streaming(chat, upstream).await {
        Ok(frames) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/x-ndjson")
            .body(Body::from_stream(frames))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(e) => {
            error!(%request_id, endpoint = %upstream.endpoint(), error = %e, "streaming setup failed");
            let err = ErrorResponse::new(format!("chat completion failed: {e}"));
            (StatusCode::BAD_GATEWAY, Json(err)).into_response()
        }
    }
}
