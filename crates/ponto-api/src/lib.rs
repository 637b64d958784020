//! ponto-api - HTTP admin API for detecting and repairing corrupted text
//!
//! The binary in `main.rs` only reads the environment and binds a listener;
//! everything a test needs to run the server in-process lives here.

pub mod handlers;
pub mod logging;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::error;
use uuid::Uuid;

use ponto_core::encoding::Normalizer;
use ponto_core::logging::subsystems;
use ponto_core::EncodingConfig;
use ponto_db::Database;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Same table as the repository's, used by the store-free endpoints.
    pub normalizer: Normalizer,
    pub config: Arc<EncodingConfig>,
}

impl AppState {
    pub fn new(db: Database, config: EncodingConfig) -> Self {
        Self::with_normalizer(db, config, Normalizer::default())
    }

    pub fn with_normalizer(db: Database, config: EncodingConfig, normalizer: Normalizer) -> Self {
        Self {
            db: db.with_normalizer(normalizer.clone()),
            normalizer,
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router with tracing and request-id middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/admin/encoding/check",
            get(handlers::encoding::check_encoding),
        )
        .route(
            "/api/admin/encoding/diagnose",
            get(handlers::encoding::diagnose_encoding),
        )
        .route(
            "/api/admin/encoding/fix",
            post(handlers::encoding::fix_encoding),
        )
        .route(
            "/api/admin/encoding/fix-text",
            post(handlers::encoding::fix_text),
        )
        .route("/api/test/encoding", get(handlers::self_test::encoding_test))
        .route(
            "/api/test/encoding/corruption-simulation",
            get(handlers::self_test::corruption_simulation),
        )
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Success envelope: `{ "success": true, ...payload }`.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    payload: T,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(payload: T) -> Json<Self> {
        Json(Self {
            success: true,
            payload,
        })
    }
}

#[derive(Debug)]
pub enum ApiError {
    Internal(ponto_core::Error),
    NotFound(String),
    BadRequest(String),
}

impl From<ponto_core::Error> for ApiError {
    fn from(err: ponto_core::Error) -> Self {
        match err {
            ponto_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            ponto_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                error!(subsystem = subsystems::API, error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}
