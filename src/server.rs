//! HTTP boundary for the assistant.
//!
//! Three routes:
//! - `GET /` — health probe with status and version.
//! - `POST /chat` — `{message, session_id?}` in, `{reply}` out. A missing
//!   `session_id` uses the shared `"default"` session. A missing or
//!   unparsable body behaves like a blank message: the fixed rejection
//!   reply with HTTP 200, never an error status.
//! - `POST /refresh` — rebuild the corpus index on demand and report its
//!   shape.
//!
//! CORS is wide open so campus front-ends can call the service directly.

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::chat::ChatService;
use crate::config::Config;

const DEFAULT_SESSION: &str = "default";

#[derive(Clone)]
struct AppState {
    chat: Arc<ChatService>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    status: &'static str,
    chunks: usize,
    built_at: String,
}

/// Serve the HTTP API until the process is stopped.
pub async fn run_server(config: &Config, chat: Arc<ChatService>) -> Result<()> {
    let state = AppState { chat };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(health))
        .route("/chat", post(handle_chat))
        .route("/refresh", post(handle_refresh))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    info!("Listening on {}", config.server.bind);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatResponse> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(_) => ChatRequest::default(),
    };

    let session_id = request.session_id.as_deref().unwrap_or(DEFAULT_SESSION);
    let reply = state.chat.handle(session_id, &request.message).await;

    Json(ChatResponse { reply })
}

async fn handle_refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    let index = state.chat.refresh().await;
    Json(RefreshResponse {
        status: "ok",
        chunks: index.chunk_count(),
        built_at: index.built_at().to_rfc3339(),
    })
}
