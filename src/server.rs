//! HTTP façade over the vector store and the answer engine.
//!
//! # Endpoints
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | `POST` | `/add_webpage` | `{"url"}` | `{"message"}` |
//! | `POST` | `/explain_text` | `{"text"}` | `{"explanation"}` |
//! | `POST` | `/clear_vector_store` | none | `{"message"}` |
//! | `POST` | `/chat` | `{"question"}` | `{"answer"}` |
//! | `GET`  | `/health` | none | `{"status", "version", "fragments"}` |
//!
//! # Error Contract
//!
//! ```json
//! { "detail": "invalid input: question must not be empty", "code": "bad_request" }
//! ```
//!
//! | Error | Status | Code |
//! |-------|--------|------|
//! | invalid input or unreadable body | 400 | `bad_request` |
//! | unknown fragment | 404 | `not_found` |
//! | embedding, chat, fetch or OCR failure | 502 | `upstream_unavailable` |
//! | anything else | 500 | `internal` |
//!
//! # CORS
//!
//! Any origin, method, and header is accepted and credentials are allowed.
//! The request's origin, method, and headers are mirrored back because the
//! CORS wildcard cannot be combined with credentials.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::embedding::OpenAIProvider;
use crate::error::RagError;
use crate::llm::OpenAIChatModel;
use crate::qa::AnswerEngine;
use crate::store::VectorStore;

/// Shared state handed to every handler. Both services are injected, so
/// tests can build one around stub providers.
#[derive(Clone)]
pub struct AppState {
    pub store: VectorStore,
    pub engine: Arc<AnswerEngine>,
}

impl AppState {
    pub fn new(store: VectorStore, engine: AnswerEngine) -> Self {
        Self {
            store,
            engine: Arc::new(engine),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/add_webpage", post(handle_add_webpage))
        .route("/explain_text", post(handle_explain_text))
        .route("/clear_vector_store", post(handle_clear))
        .route("/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Builds the OpenAI-backed services from `config` and serves until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let embedder = Arc::new(OpenAIProvider::from_env(&config.embedding)?);
    let model = Arc::new(OpenAIChatModel::from_env(&config.llm)?);

    let store = VectorStore::open(config, embedder)
        .await
        .with_context(|| format!("opening vector store at {}", config.store.path.display()))?;
    let engine = AnswerEngine::new(store.retriever(config.retrieval.k), model);
    let app = build_router(AppState::new(store, engine));

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    info!(bind = %config.server.bind, "rag server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
    code: &'static str,
}

pub struct AppError(RagError);

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

/// Unreadable bodies (bad JSON, wrong field types, missing content type)
/// answer with the same JSON error shape as every other failure.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self(RagError::InvalidInput(rejection.body_text()))
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0 {
            RagError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RagError::NotFound(_) => StatusCode::NOT_FOUND,
            RagError::Upstream(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        let body = ErrorBody {
            detail: self.0.to_string(),
            code: self.0.code(),
        };
        (status, Json(body)).into_response()
    }
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(RagError::InvalidInput(format!("{} must not be empty", field)).into());
    }
    Ok(())
}

// ============ Handlers ============

#[derive(Deserialize)]
struct AddWebpageRequest {
    #[serde(default)]
    url: String,
}

#[derive(Deserialize)]
struct ExplainRequest {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    question: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct ExplainResponse {
    explanation: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    fragments: i64,
}

async fn handle_add_webpage(
    State(state): State<AppState>,
    body: Result<Json<AddWebpageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = body?;
    let url = req.url.trim();
    require("url", url)?;
    state.store.add_webpages(&[url.to_string()]).await?;

    Ok(Json(MessageResponse {
        message: format!("Webpage {} added to the vector store.", url),
    }))
}

async fn handle_explain_text(
    State(state): State<AppState>,
    body: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ExplainResponse>, AppError> {
    let Json(req) = body?;
    require("text", &req.text)?;
    let explanation = state.engine.explain_text(&req.text).await?;
    Ok(Json(ExplainResponse { explanation }))
}

async fn handle_clear(State(state): State<AppState>) -> Result<Json<MessageResponse>, AppError> {
    state.store.clear().await?;
    Ok(Json(MessageResponse {
        message: "Vector store has been cleared.".to_string(),
    }))
}

async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = body?;
    require("question", &req.question)?;
    let answer = state.engine.ask_question(&req.question).await?;
    Ok(Json(ChatResponse { answer }))
}

async fn handle_health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let fragments = state.store.count().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        fragments,
    }))
}
