//! Activity feed endpoint.

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
};
use recipebox_common::AppResult;
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Response header carrying the cursor of the next page.
pub const NEXT_CURSOR_HEADER: &str = "x-next-cursor";

/// Feed query parameters.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Page size, at most the feed page size.
    pub limit: Option<u64>,
    /// Value of the previous page's `x-next-cursor` header.
    pub cursor: Option<String>,
}

/// Recent activity of the users the caller follows, newest first.
async fn activity_feed(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> AppResult<Response> {
    let page = state
        .feed_service
        .get_feed(user.id, query.limit, query.cursor.as_deref())
        .await?;

    let mut response = ApiResponse::ok(page.entries).into_response();
    if let Some(cursor) = page.next_cursor {
        if let Ok(value) = HeaderValue::from_str(&cursor) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(NEXT_CURSOR_HEADER), value);
        }
    }

    Ok(response)
}

/// The activity feed.
pub fn router() -> Router<AppState> {
    Router::new().route("/activity-feed", get(activity_feed))
}
