//! HTTP request handlers

use super::catalog::investment_catalog;
use super::types::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse, InvestmentSteps};
use super::AppState;
use crate::resolver::ResolveError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Liveness
        .route("/", get(health))
        // Finance chat
        .route("/chat", post(chat))
        // Investment catalog
        .route("/invest/options", get(investment_options))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Financial Assistant API is running!",
    })
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = body.map_err(|rejection| {
        AppError::Validation(rejection.status(), rejection.body_text())
    })?;

    let resolution = state.resolver.resolve(&req.user_id, &req.question).await?;
    tracing::debug!(
        user_id = %req.user_id,
        turn_id = resolution.turn_id,
        mode = ?resolution.mode,
        "Chat resolved"
    );

    Ok(Json(ChatResponse {
        llm_answer: resolution.answer,
        action_to_perform: resolution.action,
    }))
}

async fn investment_options() -> Json<InvestmentSteps> {
    Json(investment_catalog())
}

async fn get_version() -> &'static str {
    concat!("finbot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    /// Body could not be parsed into the request type
    Validation(StatusCode, String),
    /// The model call failed
    Upstream(String),
    Internal(String),
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Upstream(e) => AppError::Upstream(e.message),
            ResolveError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(status, msg) => (status, msg),
            AppError::Upstream(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("An error occurred with the LLM API: {msg}"),
            ),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
