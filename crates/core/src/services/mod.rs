//! Business logic services.

#![allow(missing_docs)]

pub mod activity;
pub mod bookmark;
pub mod comment;
pub mod event_publisher;
pub mod fanout;
pub mod feed;
pub mod following;
pub mod health;
pub mod like;
pub mod notification;
pub mod recipe;
pub mod user;

pub use activity::{ActivityService, SubEntity};
pub use bookmark::BookmarkService;
pub use comment::{CommentService, CreateCommentInput};
pub use event_publisher::{EventPublisher, EventPublisherService, NoOpEventPublisher, StreamEvent};
pub use fanout::{FanoutQueue, FanoutSender};
pub use feed::{FEED_PAGE_SIZE, FeedEntry, FeedPage, FeedService};
pub use following::FollowingService;
pub use health::{HealthReport, HealthService};
pub use like::LikeService;
pub use notification::{DispatchReport, NotificationService, NotificationView};
pub use recipe::{CreateRecipeInput, RecipeService};
pub use user::{SigninInput, SignupInput, UserService};
