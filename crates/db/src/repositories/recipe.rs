//! Recipe repository.

use std::sync::Arc;

use crate::entities::{Recipe, recipe};
use recipebox_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Recipe repository for database operations.
#[derive(Clone)]
pub struct RecipeRepository {
    db: Arc<DatabaseConnection>,
}

impl RecipeRepository {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a recipe by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<recipe::Model>> {
        Recipe::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a recipe by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<recipe::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::RecipeNotFound(id.to_string()))
    }

    /// Create a new recipe.
    pub async fn create(&self, model: recipe::ActiveModel) -> AppResult<recipe::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get recipes posted by a user, newest first (paginated).
    pub async fn find_by_user(
        &self,
        user_id: i64,
        limit: u64,
        until_id: Option<i64>,
    ) -> AppResult<Vec<recipe::Model>> {
        let mut query = Recipe::find()
            .filter(recipe::Column::UserId.eq(user_id))
            .order_by_desc(recipe::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(recipe::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a recipe. Comments, likes, bookmarks, activities and
    /// notifications referencing it cascade.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = Recipe::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    fn create_test_recipe(id: i64, user_id: i64) -> recipe::Model {
        recipe::Model {
            id,
            user_id,
            title: format!("Recipe {id}"),
            description: None,
            ingredients: json!(["flour", "water"]),
            steps: json!(["mix", "bake"]),
            image_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_recipe_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<recipe::Model>::new()])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let result = repo.get_by_id(10).await;

        assert!(matches!(result, Err(AppError::RecipeNotFound(id)) if id == "10"));
    }

    #[tokio::test]
    async fn test_find_by_user() {
        let recipes = vec![create_test_recipe(3, 1), create_test_recipe(2, 1)];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([recipes])
                .into_connection(),
        );

        let repo = RecipeRepository::new(db);
        let result = repo.find_by_user(1, 10, None).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, 3);
        assert_eq!(result[1].ingredients, json!(["flour", "water"]));
    }
}
