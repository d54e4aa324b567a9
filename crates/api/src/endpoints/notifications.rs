//! Notifications endpoints.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use recipebox_common::AppResult;
use recipebox_core::NotificationView;
use serde::Serialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, ok},
};

/// Unread count response.
#[allow(missing_docs)]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// All of the caller's notifications, newest first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<NotificationView>>> {
    let notifications = state
        .notification_service
        .list_for_recipient(user.id)
        .await?;

    Ok(ApiResponse::ok(notifications))
}

/// Mark every notification as read.
async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<StatusCode> {
    let updated = state.notification_service.mark_all_read(user.id).await?;
    tracing::debug!(user_id = user.id, updated, "Notifications marked as read");
    Ok(ok())
}

/// Number of unread notifications.
async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    let count = state.notification_service.count_unread(user.id).await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

/// Notification inbox routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/mark-read", put(mark_read))
        .route("/notifications/unread-count", get(unread_count))
}
