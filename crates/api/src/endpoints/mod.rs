//! API endpoints.

mod admin;
mod auth;
mod bookmarks;
mod comments;
mod feed;
mod following;
mod health;
mod likes;
mod notifications;
mod recipes;
mod users;

use axum::Router;
use serde::Deserialize;

use crate::middleware::AppState;

/// Largest page a list endpoint returns.
const MAX_LIMIT: u64 = 100;

/// Keyset pagination parameters shared by list endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Page size, clamped to `1..=100`.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Return only rows with a smaller ID.
    pub until_id: Option<i64>,
}

impl ListQuery {
    const fn clamped_limit(&self) -> u64 {
        if self.limit == 0 {
            1
        } else if self.limit > MAX_LIMIT {
            MAX_LIMIT
        } else {
            self.limit
        }
    }
}

const fn default_limit() -> u64 {
    20
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(following::router())
        .merge(recipes::router())
        .merge(comments::router())
        .merge(likes::router())
        .merge(bookmarks::router())
        .merge(feed::router())
        .merge(notifications::router())
        .merge(health::router())
        .merge(admin::router())
}
