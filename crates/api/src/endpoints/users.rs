//! User endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use recipebox_common::AppResult;
use recipebox_db::entities::user;
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Public user profile.
#[allow(missing_docs)]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            avatar_url: u.avatar_url,
            is_admin: u.is_admin,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Show a user.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Public profiles.
pub fn router() -> Router<AppState> {
    Router::new().route("/users/{id}", get(show))
}
