//! Following endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use recipebox_common::AppResult;
use recipebox_db::entities::following;
use serde::Serialize;

use super::ListQuery;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, created, ok},
};

/// Follow edge response.
#[allow(missing_docs)]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowingResponse {
    pub id: i64,
    pub follower_id: i64,
    pub followee_id: i64,
    pub created_at: String,
}

impl From<following::Model> for FollowingResponse {
    fn from(f: following::Model) -> Self {
        Self {
            id: f.id,
            follower_id: f.follower_id,
            followee_id: f.followee_id,
            created_at: f.created_at.to_rfc3339(),
        }
    }
}

/// Follow a user.
async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(followee_id): Path<i64>,
) -> AppResult<Response> {
    let edge = state.following_service.follow(user.id, followee_id).await?;
    Ok(created(FollowingResponse::from(edge)))
}

/// Unfollow a user.
async fn unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(followee_id): Path<i64>,
) -> AppResult<StatusCode> {
    state
        .following_service
        .unfollow(user.id, followee_id)
        .await?;
    Ok(ok())
}

/// Get followers of a user.
async fn followers(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<FollowingResponse>>> {
    let followers = state
        .following_service
        .get_followers(user_id, query.clamped_limit(), query.until_id)
        .await?;

    Ok(ApiResponse::ok(
        followers.into_iter().map(Into::into).collect(),
    ))
}

/// Get users that a user is following.
async fn following(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<FollowingResponse>>> {
    let following = state
        .following_service
        .get_following(user_id, query.clamped_limit(), query.until_id)
        .await?;

    Ok(ApiResponse::ok(
        following.into_iter().map(Into::into).collect(),
    ))
}

/// Follow graph routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/follow", post(follow).delete(unfollow))
        .route("/users/{id}/followers", get(followers))
        .route("/users/{id}/following", get(following))
}
