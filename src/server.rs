//! HTTP boundary.
//!
//! Exposes the question-answering service as a small JSON API:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/chat` | Answer a question (`{question, model_type}`) |
//! | `GET`  | `/health` | Readiness, version, and corpus statistics |
//!
//! The listener binds only after [`crate::service::initialize`] has
//! finished, so a reachable `/health` endpoint IS the readiness signal;
//! no request can race the index build.
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "invalid_model", "message": "..." } }
//! ```
//!
//! `invalid_model` and `bad_request` map to 400; everything internal
//! (`embedding_failed`, `generation_failed`, `internal`) maps to 500 and
//! carries the error text, which is acceptable for an internal tool.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser frontend
//! on another port can call the API directly.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::error::AnswerError;
use crate::router::AnswerSource;
use crate::service::ServiceState;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    service: Arc<ServiceState>,
}

/// Start the HTTP server over an initialized service. Runs until the
/// process is terminated.
pub async fn run_server(config: &ServerConfig, service: Arc<ServiceState>) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { service });

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(bind = %config.bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(code: &'static str, message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code,
        message: message.into(),
    }
}

fn internal(code: &'static str, message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code,
        message: message.into(),
    }
}

/// Translate a router error into the external error taxonomy. Client
/// mistakes become 400s; everything else is a 500 carrying the cause.
fn classify_answer_error(err: AnswerError) -> AppError {
    match &err {
        AnswerError::InvalidModel(_) => bad_request("invalid_model", err.to_string()),
        AnswerError::Embedding(_) => internal("embedding_failed", err.to_string()),
        AnswerError::Generation(_) => internal("generation_failed", err.to_string()),
        AnswerError::Index(_) | AnswerError::BackendUnavailable(_) => {
            internal("internal", err.to_string())
        }
    }
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    question: String,
    #[serde(default = "default_model_type")]
    model_type: String,
}

fn default_model_type() -> String {
    "hybrid".to_string()
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
    source: AnswerSource,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.question.trim().is_empty() {
        return Err(bad_request("bad_request", "question must not be empty"));
    }

    let answer = state
        .service
        .router
        .answer(&req.question, &req.model_type)
        .await
        .map_err(classify_answer_error)?;

    Ok(Json(ChatResponse {
        answer: answer.text,
        source: answer.source,
    }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    documents: usize,
    chunks: usize,
    embedding_model: String,
}

/// Readiness check: reachable only once the index build has completed.
async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: state.service.stats.documents,
        chunks: state.service.stats.chunks,
        embedding_model: state.service.embedding_model.clone(),
    })
}
