//! Health endpoint.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::middleware::AppState;

/// Database reachability and recent failures; 503 while the database is
/// unreachable.
async fn health(State(state): State<AppState>) -> Response {
    let report = state.health_service.check().await;

    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(report)).into_response()
}

/// Unauthenticated health check.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
