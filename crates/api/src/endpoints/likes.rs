//! Like endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::post,
};
use recipebox_common::AppResult;
use recipebox_db::entities::recipe_like;
use serde::Serialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{created, ok},
};

/// Like response.
#[allow(missing_docs)]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub id: i64,
    pub recipe_id: i64,
    pub like_count: u64,
    pub created_at: String,
}

/// Like a recipe.
async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> AppResult<Response> {
    let like: recipe_like::Model = state.like_service.like(user.id, recipe_id).await?;
    let like_count = state.like_service.count(recipe_id).await?;

    Ok(created(LikeResponse {
        id: like.id,
        recipe_id: like.recipe_id,
        like_count,
        created_at: like.created_at.to_rfc3339(),
    }))
}

/// Remove a like.
async fn unlike(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.like_service.unlike(user.id, recipe_id).await?;
    Ok(ok())
}

/// Like and unlike.
pub fn router() -> Router<AppState> {
    Router::new().route("/recipes/{id}/like", post(like).delete(unlike))
}
