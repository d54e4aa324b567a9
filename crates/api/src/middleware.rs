//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use recipebox_common::ErrorLog;
use recipebox_core::{
    BookmarkService, CommentService, FeedService, FollowingService, HealthService, LikeService,
    NotificationService, RecipeService, UserService,
};

use crate::realtime::ChannelRegistry;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub following_service: FollowingService,
    pub recipe_service: RecipeService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
    pub bookmark_service: BookmarkService,
    pub feed_service: FeedService,
    pub notification_service: NotificationService,
    pub health_service: HealthService,
    pub registry: ChannelRegistry,
    pub error_log: ErrorLog,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Requests without a valid token pass through
/// unauthenticated; handlers that need a user reject them.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = token {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token rejected");
            }
        }
    }

    next.run(req).await
}

/// Record every 5xx response in the shared error log.
pub async fn capture_server_errors(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;

    let status = response.status();
    if status.is_server_error() {
        state
            .error_log
            .record("http", format!("{method} {path} -> {status}"));
    }

    response
}
