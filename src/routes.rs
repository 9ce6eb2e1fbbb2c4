use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::types::{CompletionPayload, DeliveryResponse, ErrorResponse, HealthResponse};
use crate::webhook::CompletionRegistry;

/// Shared application state passed to all route handlers.
pub struct AppState {
    pub registry: Arc<CompletionRegistry>,
}

/// POST /sessions/:session_id/complete: deliver a session's terminal result.
///
/// Request body: CompletionPayload { proof } or { error: { kind, reason? } }
/// Response: DeliveryResponse { delivered: true }, 404 when no session is waiting
pub async fn complete_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<CompletionPayload>,
) -> Response {
    let result = match payload.into_result() {
        Ok(result) => result,
        Err(error) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
        }
    };

    if state.registry.complete(&session_id, result) {
        (StatusCode::OK, Json(DeliveryResponse { delivered: true })).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No pending session: {}", session_id),
            }),
        )
            .into_response()
    }
}

/// GET /health: health check endpoint.
///
/// Response: HealthResponse { status: "ok", pendingSessions: N }
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            pending_sessions: state.registry.pending_count(),
        }),
    )
}

/// Build the axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> axum::Router {
    use axum::routing::{get, post};
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    axum::Router::new()
        .route("/sessions/:session_id/complete", post(complete_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}
