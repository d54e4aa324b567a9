//! Recipe service.

use chrono::Utc;
use recipebox_common::{AppError, AppResult};
use recipebox_db::{
    entities::{activity::ActivityType, recipe, user},
    repositories::RecipeRepository,
};
use sea_orm::{NotSet, Set};
use serde::Deserialize;
use validator::Validate;

use crate::services::activity::{ActivityService, SubEntity};

/// Input for posting a recipe.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeInput {
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(max = 10000))]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(length(max = 200))]
    pub ingredients: Vec<String>,

    #[serde(default)]
    #[validate(length(max = 200))]
    pub steps: Vec<String>,

    #[validate(url)]
    pub image_url: Option<String>,
}

/// Recipe service for business logic.
#[derive(Clone)]
pub struct RecipeService {
    recipe_repo: RecipeRepository,
    activity_service: ActivityService,
}

impl RecipeService {
    /// Create a new recipe service.
    #[must_use]
    pub const fn new(recipe_repo: RecipeRepository, activity_service: ActivityService) -> Self {
        Self {
            recipe_repo,
            activity_service,
        }
    }

    /// Post a recipe and record a `new_recipe` activity for it.
    pub async fn create(&self, user_id: i64, input: CreateRecipeInput) -> AppResult<recipe::Model> {
        input.validate()?;

        let model = recipe::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            title: Set(input.title),
            description: Set(input.description),
            ingredients: Set(serde_json::json!(input.ingredients)),
            steps: Set(serde_json::json!(input.steps)),
            image_url: Set(input.image_url),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let recipe = self.recipe_repo.create(model).await?;

        self.activity_service
            .mirror(user_id, ActivityType::NewRecipe, recipe.id, SubEntity::None)
            .await;

        Ok(recipe)
    }

    /// Get a recipe by ID.
    pub async fn get(&self, id: i64) -> AppResult<recipe::Model> {
        self.recipe_repo.get_by_id(id).await
    }

    /// Recipes posted by a user, newest first.
    pub async fn list_by_user(
        &self,
        user_id: i64,
        limit: u64,
        until_id: Option<i64>,
    ) -> AppResult<Vec<recipe::Model>> {
        self.recipe_repo.find_by_user(user_id, limit, until_id).await
    }

    /// Delete a recipe. Only its owner or an administrator may do so.
    pub async fn delete(&self, actor: &user::Model, id: i64) -> AppResult<()> {
        let recipe = self.recipe_repo.get_by_id(id).await?;

        if recipe.user_id != actor.id && !actor.is_admin {
            return Err(AppError::Forbidden(
                "Only the owner can delete this recipe".to_string(),
            ));
        }

        self.recipe_repo.delete(id).await?;
        tracing::info!(recipe_id = id, deleted_by = actor.id, "Recipe deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use recipebox_db::entities::activity;
    use recipebox_db::repositories::ActivityRepository;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_user(id: i64, is_admin: bool) -> user::Model {
        user::Model {
            id,
            name: format!("user{id}"),
            email: format!("user{id}@example.com"),
            avatar_url: None,
            is_admin,
            password_hash: "hash".to_string(),
            token: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_recipe(id: i64, user_id: i64) -> recipe::Model {
        recipe::Model {
            id,
            user_id,
            title: "Curry".to_string(),
            description: None,
            ingredients: json!(["rice"]),
            steps: json!(["cook"]),
            image_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_activity(recipe_id: i64, actor_id: i64) -> activity::Model {
        activity::Model {
            id: 1,
            actor_id,
            activity_type: ActivityType::NewRecipe,
            recipe_id,
            comment_id: None,
            like_id: None,
            bookmark_id: None,
            weight: 1,
            created_at: Utc::now().into(),
        }
    }

    fn service(recipe_db: MockDatabase, activity_db: MockDatabase) -> RecipeService {
        let recipe_conn = Arc::new(recipe_db.into_connection());
        let activity_service = ActivityService::new(
            ActivityRepository::new(Arc::new(activity_db.into_connection())),
            RecipeRepository::new(recipe_conn.clone()),
        );
        RecipeService::new(RecipeRepository::new(recipe_conn), activity_service)
    }

    #[tokio::test]
    async fn test_create_records_new_recipe_activity() {
        let recipe = create_test_recipe(10, 1);
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[recipe.clone()], [recipe.clone()]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_activity(10, 1)]]),
        );

        let input = CreateRecipeInput {
            title: "Curry".to_string(),
            description: None,
            ingredients: vec!["rice".to_string()],
            steps: vec!["cook".to_string()],
            image_url: None,
        };

        let created = service.create(1, input).await.unwrap();
        assert_eq!(created.id, 10);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let input = CreateRecipeInput {
            title: String::new(),
            description: None,
            ingredients: Vec::new(),
            steps: Vec::new(),
            image_url: None,
        };

        let result = service.create(1, input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_by_stranger_is_forbidden() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_recipe(10, 1)]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.delete(&create_test_user(2, false), 10).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_admin_can_delete_any_recipe() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_recipe(10, 1)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        service.delete(&create_test_user(9, true), 10).await.unwrap();
    }
}
