//! Core business logic for recipebox.
//!
//! Services sit between the HTTP layer and the repositories. The social
//! pipeline runs through [`ActivityService`] (append to the activity log),
//! [`FanoutQueue`] (post-commit hand-off) and [`NotificationService`]
//! (notification rows plus realtime pushes). [`FeedService`] reads the log
//! back for followers.

pub mod services;

pub use services::*;
