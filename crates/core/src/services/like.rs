//! Like service.

use chrono::Utc;
use recipebox_common::{AppError, AppResult};
use recipebox_db::{
    entities::{activity::ActivityType, recipe_like},
    repositories::{LikeRepository, RecipeRepository},
};
use sea_orm::{NotSet, Set};

use crate::services::activity::{ActivityService, SubEntity};

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    recipe_repo: RecipeRepository,
    activity_service: ActivityService,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        like_repo: LikeRepository,
        recipe_repo: RecipeRepository,
        activity_service: ActivityService,
    ) -> Self {
        Self {
            like_repo,
            recipe_repo,
            activity_service,
        }
    }

    /// Like a recipe and record a `like` activity.
    ///
    /// Liking your own recipe is allowed; the dispatcher simply sends no
    /// notification for it.
    pub async fn like(&self, user_id: i64, recipe_id: i64) -> AppResult<recipe_like::Model> {
        self.recipe_repo.get_by_id(recipe_id).await?;

        if self
            .like_repo
            .find_by_pair(user_id, recipe_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Already liked".to_string()));
        }

        let model = recipe_like::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            created_at: Set(Utc::now().into()),
        };

        let like = self.like_repo.create(model).await?;

        self.activity_service
            .mirror(user_id, ActivityType::Like, recipe_id, SubEntity::Like(like.id))
            .await;

        Ok(like)
    }

    /// Remove a like. Its activity goes with it.
    pub async fn unlike(&self, user_id: i64, recipe_id: i64) -> AppResult<()> {
        if !self.like_repo.delete_by_pair(user_id, recipe_id).await? {
            return Err(AppError::NotFound("Not liked".to_string()));
        }
        Ok(())
    }

    /// Number of likes on a recipe.
    pub async fn count(&self, recipe_id: i64) -> AppResult<u64> {
        self.like_repo.count_by_recipe(recipe_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use recipebox_common::ErrorLog;
    use recipebox_db::entities::{activity, recipe};
    use recipebox_db::repositories::ActivityRepository;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_recipe(id: i64, owner: i64) -> recipe::Model {
        recipe::Model {
            id,
            user_id: owner,
            title: "Cake".to_string(),
            description: None,
            ingredients: json!([]),
            steps: json!([]),
            image_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_like(id: i64, user_id: i64, recipe_id: i64) -> recipe_like::Model {
        recipe_like::Model {
            id,
            user_id,
            recipe_id,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_like_twice_is_conflict() {
        let recipe_conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_recipe(10, 1)]])
                .into_connection(),
        );
        let like_conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_like(4, 2, 10)]])
                .into_connection(),
        );
        let activity_conn = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = LikeService::new(
            LikeRepository::new(like_conn),
            RecipeRepository::new(recipe_conn.clone()),
            ActivityService::new(
                ActivityRepository::new(activity_conn),
                RecipeRepository::new(recipe_conn),
            ),
        );

        let result = service.like(2, 10).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_self_like_is_recorded() {
        let recipe_conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_recipe(10, 1)], [create_test_recipe(10, 1)]])
                .into_connection(),
        );
        let like_conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<recipe_like::Model>::new()])
                .append_query_results([[create_test_like(4, 1, 10)]])
                .into_connection(),
        );
        let activity_conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[activity::Model {
                    id: 1,
                    actor_id: 1,
                    activity_type: ActivityType::Like,
                    recipe_id: 10,
                    comment_id: None,
                    like_id: Some(4),
                    bookmark_id: None,
                    weight: 1,
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        );

        let service = LikeService::new(
            LikeRepository::new(like_conn),
            RecipeRepository::new(recipe_conn.clone()),
            ActivityService::new(
                ActivityRepository::new(activity_conn),
                RecipeRepository::new(recipe_conn),
            ),
        );

        let like = service.like(1, 10).await.unwrap();
        assert_eq!(like.id, 4);
    }

    #[tokio::test]
    async fn test_like_survives_failed_activity_write() {
        let recipe_conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_recipe(10, 1)], [create_test_recipe(10, 1)]])
                .into_connection(),
        );
        let like_conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<recipe_like::Model>::new()])
                .append_query_results([[create_test_like(4, 2, 10)]])
                .into_connection(),
        );
        // No activity insert queued: the activity write fails.
        let activity_conn = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let errors = ErrorLog::new(4);
        let mut activity_service = ActivityService::new(
            ActivityRepository::new(activity_conn),
            RecipeRepository::new(recipe_conn.clone()),
        );
        activity_service.set_error_log(errors.clone());

        let service = LikeService::new(
            LikeRepository::new(like_conn),
            RecipeRepository::new(recipe_conn),
            activity_service,
        );

        let like = service.like(2, 10).await.unwrap();

        assert_eq!(like.id, 4);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.recent()[0].source, "activity");
    }
}
