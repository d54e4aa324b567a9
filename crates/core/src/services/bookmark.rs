//! Bookmark service.

use chrono::Utc;
use recipebox_common::{AppError, AppResult};
use recipebox_db::{
    entities::{activity::ActivityType, bookmark},
    repositories::{BookmarkRepository, RecipeRepository},
};
use sea_orm::{NotSet, Set};

use crate::services::activity::{ActivityService, SubEntity};

/// Bookmark service for business logic.
#[derive(Clone)]
pub struct BookmarkService {
    bookmark_repo: BookmarkRepository,
    recipe_repo: RecipeRepository,
    activity_service: ActivityService,
}

impl BookmarkService {
    /// Create a new bookmark service.
    #[must_use]
    pub const fn new(
        bookmark_repo: BookmarkRepository,
        recipe_repo: RecipeRepository,
        activity_service: ActivityService,
    ) -> Self {
        Self {
            bookmark_repo,
            recipe_repo,
            activity_service,
        }
    }

    /// Bookmark a recipe and record a `bookmark` activity.
    pub async fn add(&self, user_id: i64, recipe_id: i64) -> AppResult<bookmark::Model> {
        self.recipe_repo.get_by_id(recipe_id).await?;

        if self
            .bookmark_repo
            .find_by_pair(user_id, recipe_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Already bookmarked".to_string()));
        }

        let model = bookmark::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            created_at: Set(Utc::now().into()),
        };

        let bookmark = self.bookmark_repo.create(model).await?;

        self.activity_service
            .mirror(
                user_id,
                ActivityType::Bookmark,
                recipe_id,
                SubEntity::Bookmark(bookmark.id),
            )
            .await;

        Ok(bookmark)
    }

    /// Remove a bookmark.
    pub async fn remove(&self, user_id: i64, recipe_id: i64) -> AppResult<()> {
        if !self.bookmark_repo.delete_by_pair(user_id, recipe_id).await? {
            return Err(AppError::NotFound("Not bookmarked".to_string()));
        }
        Ok(())
    }

    /// The user's own bookmarks, newest first.
    pub async fn list(
        &self,
        user_id: i64,
        limit: u64,
        until_id: Option<i64>,
    ) -> AppResult<Vec<bookmark::Model>> {
        self.bookmark_repo
            .find_by_user(user_id, limit, until_id)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use recipebox_db::entities::{activity, recipe};
    use recipebox_db::repositories::ActivityRepository;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_recipe(id: i64, owner: i64) -> recipe::Model {
        recipe::Model {
            id,
            user_id: owner,
            title: "Pho".to_string(),
            description: None,
            ingredients: json!([]),
            steps: json!([]),
            image_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_add_records_bookmark_activity() {
        let now = Utc::now();
        let recipe_conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_recipe(10, 1)], [create_test_recipe(10, 1)]])
                .into_connection(),
        );
        let bookmark_conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<bookmark::Model>::new()])
                .append_query_results([[bookmark::Model {
                    id: 5,
                    user_id: 2,
                    recipe_id: 10,
                    created_at: now.into(),
                }]])
                .into_connection(),
        );
        let activity_conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[activity::Model {
                    id: 1,
                    actor_id: 2,
                    activity_type: ActivityType::Bookmark,
                    recipe_id: 10,
                    comment_id: None,
                    like_id: None,
                    bookmark_id: Some(5),
                    weight: 1,
                    created_at: now.into(),
                }]])
                .into_connection(),
        );

        let service = BookmarkService::new(
            BookmarkRepository::new(bookmark_conn),
            RecipeRepository::new(recipe_conn.clone()),
            ActivityService::new(
                ActivityRepository::new(activity_conn.clone()),
                RecipeRepository::new(recipe_conn),
            ),
        );

        let bookmark = service.add(2, 10).await.unwrap();
        assert_eq!(bookmark.id, 5);
        drop(service);

        let log = Arc::try_unwrap(activity_conn)
            .unwrap()
            .into_transaction_log();
        let insert = &log[0].statements()[0];
        assert!(insert.sql.contains("\"bookmark_id\""));
        let values = &insert.values.as_ref().unwrap().0;
        assert!(values.contains(&Value::BigInt(Some(5))));
    }

    #[tokio::test]
    async fn test_remove_absent_bookmark() {
        let empty = || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let bookmark_conn = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let service = BookmarkService::new(
            BookmarkRepository::new(bookmark_conn),
            RecipeRepository::new(empty()),
            ActivityService::new(ActivityRepository::new(empty()), RecipeRepository::new(empty())),
        );

        let result = service.remove(1, 10).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
