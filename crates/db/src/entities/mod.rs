//! Database entities.

#![allow(missing_docs)]

pub mod activity;
pub mod bookmark;
pub mod comment;
pub mod following;
pub mod notification;
pub mod recipe;
pub mod recipe_like;
pub mod user;

pub use activity::Entity as Activity;
pub use bookmark::Entity as Bookmark;
pub use comment::Entity as Comment;
pub use following::Entity as Following;
pub use notification::Entity as Notification;
pub use recipe::Entity as Recipe;
pub use recipe_like::Entity as RecipeLike;
pub use user::Entity as User;
