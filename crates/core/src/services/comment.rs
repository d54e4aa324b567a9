//! Comment service.

use chrono::Utc;
use recipebox_common::{AppError, AppResult};
use recipebox_db::{
    entities::{activity::ActivityType, comment, user},
    repositories::{CommentRepository, RecipeRepository},
};
use sea_orm::{NotSet, Set};
use serde::Deserialize;
use validator::Validate;

use crate::services::activity::{ActivityService, SubEntity};

/// Input for commenting on a recipe.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    recipe_repo: RecipeRepository,
    activity_service: ActivityService,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        recipe_repo: RecipeRepository,
        activity_service: ActivityService,
    ) -> Self {
        Self {
            comment_repo,
            recipe_repo,
            activity_service,
        }
    }

    /// Comment on a recipe and record a `comment` activity.
    pub async fn create(
        &self,
        user_id: i64,
        recipe_id: i64,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;
        self.recipe_repo.get_by_id(recipe_id).await?;

        let model = comment::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            text: Set(input.text),
            created_at: Set(Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;

        self.activity_service
            .mirror(
                user_id,
                ActivityType::Comment,
                recipe_id,
                SubEntity::Comment(comment.id),
            )
            .await;

        Ok(comment)
    }

    /// Comments on a recipe, oldest first.
    pub async fn list(
        &self,
        recipe_id: i64,
        limit: u64,
        since_id: Option<i64>,
    ) -> AppResult<Vec<comment::Model>> {
        self.recipe_repo.get_by_id(recipe_id).await?;
        self.comment_repo
            .find_by_recipe(recipe_id, limit, since_id)
            .await
    }

    /// Delete a comment. Only its author or an administrator may do so.
    pub async fn delete(&self, actor: &user::Model, id: i64) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(id).await?;

        if comment.user_id != actor.id && !actor.is_admin {
            return Err(AppError::Forbidden(
                "Only the author can delete this comment".to_string(),
            ));
        }

        self.comment_repo.delete(id).await?;
        Ok(())
    }
}
