//! Following service.

use chrono::Utc;
use recipebox_common::{AppError, AppResult};
use recipebox_db::{
    entities::following,
    repositories::{FollowingRepository, UserRepository},
};
use sea_orm::{NotSet, Set};

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    following_repo: FollowingRepository,
    user_repo: UserRepository,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(following_repo: FollowingRepository, user_repo: UserRepository) -> Self {
        Self {
            following_repo,
            user_repo,
        }
    }

    /// Follow a user.
    pub async fn follow(&self, follower_id: i64, followee_id: i64) -> AppResult<following::Model> {
        if follower_id == followee_id {
            return Err(AppError::InvalidOperation(
                "Cannot follow yourself".to_string(),
            ));
        }

        self.user_repo.get_by_id(followee_id).await?;

        if self
            .following_repo
            .is_following(follower_id, followee_id)
            .await?
        {
            return Err(AppError::Conflict("Already following".to_string()));
        }

        let model = following::ActiveModel {
            id: NotSet,
            follower_id: Set(follower_id),
            followee_id: Set(followee_id),
            created_at: Set(Utc::now().into()),
        };

        let edge = self.following_repo.create(model).await?;

        tracing::debug!(follower_id, followee_id, "Follow edge created");

        Ok(edge)
    }

    /// Unfollow a user.
    pub async fn unfollow(&self, follower_id: i64, followee_id: i64) -> AppResult<()> {
        if !self
            .following_repo
            .delete_by_pair(follower_id, followee_id)
            .await?
        {
            return Err(AppError::NotFound("Not following".to_string()));
        }

        tracing::debug!(follower_id, followee_id, "Follow edge removed");
        Ok(())
    }

    /// Check if a user is following another user.
    pub async fn is_following(&self, follower_id: i64, followee_id: i64) -> AppResult<bool> {
        self.following_repo
            .is_following(follower_id, followee_id)
            .await
    }

    /// IDs of the users `user_id` follows.
    pub async fn list_followees(&self, user_id: i64) -> AppResult<Vec<i64>> {
        self.following_repo.find_followee_ids(user_id).await
    }

    /// IDs of the users following `user_id`.
    pub async fn list_followers(&self, user_id: i64) -> AppResult<Vec<i64>> {
        self.following_repo.find_follower_ids(user_id).await
    }

    /// Get followers of a user (paginated).
    pub async fn get_followers(
        &self,
        user_id: i64,
        limit: u64,
        until_id: Option<i64>,
    ) -> AppResult<Vec<following::Model>> {
        self.user_repo.get_by_id(user_id).await?;
        self.following_repo
            .find_followers(user_id, limit, until_id)
            .await
    }

    /// Get users followed by a user (paginated).
    pub async fn get_following(
        &self,
        user_id: i64,
        limit: u64,
        until_id: Option<i64>,
    ) -> AppResult<Vec<following::Model>> {
        self.user_repo.get_by_id(user_id).await?;
        self.following_repo
            .find_following(user_id, limit, until_id)
            .await
    }
}
