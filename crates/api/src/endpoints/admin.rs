//! Admin endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::delete,
};
use recipebox_common::AppResult;

use crate::{extractors::AdminUser, middleware::AppState, response::ok};

/// Delete a user and everything they own.
async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.user_service.delete_user(&admin, id).await?;
    Ok(ok())
}

/// Administrator-only routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin/users/{id}", delete(delete_user))
}
