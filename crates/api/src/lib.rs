//! HTTP API layer for recipebox.
//!
//! This crate provides the REST API and real-time streaming:
//!
//! - **Endpoints**: users, follows, recipes, comments, likes, bookmarks,
//!   activity feed, notifications, health
//! - **Extractors**: bearer-token authentication
//! - **Middleware**: authentication, server-error capture
//! - **Realtime**: per-user rooms over WebSocket
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod realtime;
pub mod response;
pub mod streaming;

use axum::{Router, middleware::from_fn_with_state, routing::get};

pub use endpoints::router;
pub use middleware::AppState;
pub use realtime::{ChannelRegistry, ConnectionId};
pub use streaming::streaming_handler;

/// Build the full application: REST routes, the streaming endpoint and the
/// authentication and error-capture middleware, bound to `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/streaming", get(streaming_handler))
        .merge(router())
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::capture_server_errors,
        ))
        .with_state(state)
}
