//! Bookmark endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use recipebox_common::AppResult;
use recipebox_db::entities::bookmark;
use serde::Serialize;

use super::ListQuery;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, created, ok},
};

/// Bookmark response.
#[allow(missing_docs)]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkResponse {
    pub id: i64,
    pub recipe_id: i64,
    pub created_at: String,
}

impl From<bookmark::Model> for BookmarkResponse {
    fn from(b: bookmark::Model) -> Self {
        Self {
            id: b.id,
            recipe_id: b.recipe_id,
            created_at: b.created_at.to_rfc3339(),
        }
    }
}

/// Bookmark a recipe.
async fn add(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> AppResult<Response> {
    let bookmark = state.bookmark_service.add(user.id, recipe_id).await?;
    Ok(created(BookmarkResponse::from(bookmark)))
}

/// Remove a bookmark.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.bookmark_service.remove(user.id, recipe_id).await?;
    Ok(ok())
}

/// The caller's bookmarks.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<BookmarkResponse>>> {
    let bookmarks = state
        .bookmark_service
        .list(user.id, query.clamped_limit(), query.until_id)
        .await?;

    Ok(ApiResponse::ok(bookmarks.into_iter().map(Into::into).collect()))
}

/// Bookmark toggling and the caller's bookmark list.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes/{id}/bookmark", post(add).delete(remove))
        .route("/bookmarks", get(list))
}
