//! Shared server state, error mapping and the health endpoint

use crate::books::{BookError, BookManager};
use crate::events::EventBus;
use crate::AuthConfig;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Shared server state
pub struct ServerState {
    /// Producer side: every successful mutation is announced on `event_bus`
    pub books: Arc<BookManager>,
    /// Subscriber registry shared with the WebSocket adapter
    pub event_bus: Arc<EventBus>,
    /// Auth config — None means deny-by-default
    pub auth_config: Option<AuthConfig>,
    /// Interval between WebSocket pings
    pub ping_interval: Duration,
}

/// Shared catalog state
pub type CatalogState = Arc<ServerState>;

// ============================================================================
// Health check
// ============================================================================

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of currently registered WebSocket subscribers
    pub subscribers: usize,
}

/// Health check handler
pub async fn health(State(state): State<CatalogState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        subscribers: state.event_bus.subscriber_count(),
    })
}

// ============================================================================
// Error handling
// ============================================================================

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

/// Malformed or mistyped request bodies are client errors, reported like any other.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::Validation(msg) => AppError::BadRequest(msg),
            BookError::NotFound(_) => AppError::NotFound("Book not found".to_string()),
            BookError::Store(e) => AppError::Internal(e),
        }
    }
}
