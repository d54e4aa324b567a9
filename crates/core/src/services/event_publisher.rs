//! Event publisher service.
//!
//! Provides an abstraction for pushing real-time events to a user's room.
//! The implementation lives in the API crate (the WebSocket channel registry).

use async_trait::async_trait;
use recipebox_common::AppResult;
use std::sync::Arc;

/// Event names pushed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    /// A single notification was just created for the user.
    NotificationCreated,
    /// The user's full notification list, sent when they fetch it.
    NewNotification,
}

impl StreamEvent {
    /// Wire name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotificationCreated => "notificationCreated",
            Self::NewNotification => "newNotification",
        }
    }
}

/// Trait for publishing real-time events.
///
/// This allows the core services to push events without depending on the
/// transport.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Push `payload` to every live connection in `user_id`'s room.
    ///
    /// Returns the number of connections reached; zero when nobody is
    /// listening.
    async fn publish_to_user(
        &self,
        user_id: i64,
        event: StreamEvent,
        payload: serde_json::Value,
    ) -> AppResult<usize>;
}

/// A no-op implementation of `EventPublisher` for testing or when real-time
/// events are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_to_user(
        &self,
        _user_id: i64,
        _event: StreamEvent,
        _payload: serde_json::Value,
    ) -> AppResult<usize> {
        Ok(0)
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_names() {
        assert_eq!(StreamEvent::NotificationCreated.as_str(), "notificationCreated");
        assert_eq!(StreamEvent::NewNotification.as_str(), "newNotification");
    }

    #[tokio::test]
    async fn test_noop_reaches_nobody() {
        let publisher: EventPublisherService = Arc::new(NoOpEventPublisher);
        let reached = publisher
            .publish_to_user(1, StreamEvent::NotificationCreated, json!({}))
            .await
            .unwrap();
        assert_eq!(reached, 0);
    }
}
