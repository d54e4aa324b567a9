//! Recipe like repository.

use std::sync::Arc;

use crate::entities::{RecipeLike, recipe_like};
use recipebox_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a like by user and recipe.
    pub async fn find_by_pair(
        &self,
        user_id: i64,
        recipe_id: i64,
    ) -> AppResult<Option<recipe_like::Model>> {
        RecipeLike::find()
            .filter(recipe_like::Column::UserId.eq(user_id))
            .filter(recipe_like::Column::RecipeId.eq(recipe_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a like. A duplicate (user, recipe) pair is a conflict.
    pub async fn create(&self, model: recipe_like::ActiveModel) -> AppResult<recipe_like::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::from_insert(&e, "Already liked"))
    }

    /// Delete a like by pair. Its activity row cascades.
    pub async fn delete_by_pair(&self, user_id: i64, recipe_id: i64) -> AppResult<bool> {
        let result = RecipeLike::delete_many()
            .filter(recipe_like::Column::UserId.eq(user_id))
            .filter(recipe_like::Column::RecipeId.eq(recipe_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Count likes on a recipe.
    pub async fn count_by_recipe(&self, recipe_id: i64) -> AppResult<u64> {
        RecipeLike::find()
            .filter(recipe_like::Column::RecipeId.eq(recipe_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_by_pair() {
        let like = recipe_like::Model {
            id: 4,
            user_id: 1,
            recipe_id: 2,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like.clone()]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert_eq!(repo.find_by_pair(1, 2).await.unwrap(), Some(like));
    }

    #[tokio::test]
    async fn test_delete_by_pair_absent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(!repo.delete_by_pair(1, 2).await.unwrap());
    }
}
