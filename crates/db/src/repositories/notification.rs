//! Notification repository.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

use crate::entities::notification::NotificationType;
use crate::entities::{Notification, notification, recipe, user};
use recipebox_common::{AppError, AppResult};

/// Notification joined with its actor and (optional) recipe.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct NotificationRow {
    pub id: i64,
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<FixedOffset>,
    pub actor_id: i64,
    pub actor_name: String,
    pub recipe_id: Option<i64>,
    pub recipe_title: Option<String>,
}

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new notification.
    pub async fn create(&self, model: notification::ActiveModel) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user's notifications with actor and recipe, newest first.
    pub async fn find_with_details(&self, recipient_id: i64) -> AppResult<Vec<NotificationRow>> {
        Notification::find()
            .select_only()
            .columns([
                notification::Column::Id,
                notification::Column::NotificationType,
                notification::Column::IsRead,
                notification::Column::CreatedAt,
                notification::Column::ActorId,
                notification::Column::RecipeId,
            ])
            .column_as(user::Column::Name, "actor_name")
            .column_as(recipe::Column::Title, "recipe_title")
            .join(JoinType::InnerJoin, notification::Relation::Actor.def())
            .join(JoinType::LeftJoin, notification::Relation::Recipe.def())
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .into_model::<NotificationRow>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark all notifications as read for a user.
    ///
    /// Returns the number of rows flipped; already-read rows are untouched.
    pub async fn mark_all_as_read(&self, user_id: i64) -> AppResult<u64> {
        let result = Notification::update_many()
            .filter(notification::Column::RecipientId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .col_expr(notification::Column::IsRead, true.into())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: i64) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::RecipientId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
