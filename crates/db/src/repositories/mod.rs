//! Repositories for database access.

mod activity;
mod bookmark;
mod comment;
mod following;
mod notification;
mod recipe;
mod recipe_like;
mod user;

pub use activity::{ActivityRepository, FeedCursor, FeedRow};
pub use bookmark::BookmarkRepository;
pub use comment::CommentRepository;
pub use following::FollowingRepository;
pub use notification::{NotificationRepository, NotificationRow};
pub use recipe::RecipeRepository;
pub use recipe_like::LikeRepository;
pub use user::UserRepository;
