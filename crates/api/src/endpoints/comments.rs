//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{delete, get},
};
use recipebox_common::AppResult;
use recipebox_core::CreateCommentInput;
use recipebox_db::entities::comment;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, created, ok},
};

/// Comment list parameters; comments read oldest first.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListQuery {
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Return only comments with a larger ID.
    pub since_id: Option<i64>,
}

const fn default_limit() -> u64 {
    50
}

/// Comment response.
#[allow(missing_docs)]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub user_id: i64,
    pub recipe_id: i64,
    pub text: String,
    pub created_at: String,
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            recipe_id: c.recipe_id,
            text: c.text,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Comment on a recipe.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<Response> {
    let comment = state
        .comment_service
        .create(user.id, recipe_id, input)
        .await?;
    Ok(created(CommentResponse::from(comment)))
}

/// Comments on a recipe.
async fn list(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
    Query(query): Query<CommentListQuery>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state
        .comment_service
        .list(recipe_id, query.limit.clamp(1, 100), query.since_id)
        .await?;

    Ok(ApiResponse::ok(comments.into_iter().map(Into::into).collect()))
}

/// Delete a comment.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.comment_service.delete(&user, id).await?;
    Ok(ok())
}

/// Recipe comment routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes/{id}/comments", get(list).post(create))
        .route("/comments/{id}", delete(remove))
}
