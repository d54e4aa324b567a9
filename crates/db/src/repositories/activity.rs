//! Activity log repository.
//!
//! Reads are keyset-paginated on `(created_at DESC, id DESC)`. A page is
//! continued with the [`FeedCursor`] of its last row, so rows inserted between
//! two calls never shift the contents of later pages.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

use crate::entities::activity::ActivityType;
use crate::entities::{Activity, activity, comment, recipe, user};
use recipebox_common::{AppError, AppResult};

/// Position of the last activity seen by a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedCursor {
    /// Creation time of the last row returned.
    pub created_at: DateTime<FixedOffset>,
    /// ID of the last row returned.
    pub id: i64,
}

impl FeedCursor {
    /// Cursor pointing just past the given row.
    #[must_use]
    pub const fn new(created_at: DateTime<FixedOffset>, id: i64) -> Self {
        Self { created_at, id }
    }

    fn condition(self) -> Condition {
        Condition::any()
            .add(activity::Column::CreatedAt.lt(self.created_at))
            .add(
                Condition::all()
                    .add(activity::Column::CreatedAt.eq(self.created_at))
                    .add(activity::Column::Id.lt(self.id)),
            )
    }
}

/// Wire format: `{created_at_micros}_{id}`.
impl fmt::Display for FeedCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.created_at.timestamp_micros(), self.id)
    }
}

impl FromStr for FeedCursor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::BadRequest(format!("Invalid cursor: {s}"));

        let (micros, id) = s.split_once('_').ok_or_else(invalid)?;
        let micros: i64 = micros.parse().map_err(|_| invalid())?;
        let id: i64 = id.parse().map_err(|_| invalid())?;
        let created_at = DateTime::from_timestamp_micros(micros).ok_or_else(invalid)?;

        Ok(Self {
            created_at: created_at.fixed_offset(),
            id,
        })
    }
}

/// Activity joined with everything a feed entry displays.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct FeedRow {
    pub id: i64,
    pub actor_id: i64,
    pub activity_type: ActivityType,
    pub recipe_id: i64,
    pub comment_id: Option<i64>,
    pub like_id: Option<i64>,
    pub bookmark_id: Option<i64>,
    pub weight: i32,
    pub created_at: DateTime<FixedOffset>,
    pub actor_name: String,
    pub actor_avatar_url: Option<String>,
    pub recipe_title: String,
    pub recipe_image_url: Option<String>,
    pub comment_text: Option<String>,
}

impl FeedRow {
    /// Cursor continuing after this row.
    #[must_use]
    pub const fn cursor(&self) -> FeedCursor {
        FeedCursor::new(self.created_at, self.id)
    }
}

/// Activity repository for database operations.
#[derive(Clone)]
pub struct ActivityRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityRepository {
    /// Create a new activity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an activity by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<activity::Model>> {
        Activity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Append an activity.
    pub async fn create(&self, model: activity::ActiveModel) -> AppResult<activity::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent activities by any of `actor_ids`.
    ///
    /// An empty actor set returns immediately without touching the database.
    pub async fn find_recent(
        &self,
        actor_ids: &[i64],
        limit: u64,
        cursor: Option<FeedCursor>,
    ) -> AppResult<Vec<activity::Model>> {
        if actor_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = Activity::find()
            .filter(activity::Column::ActorId.is_in(actor_ids.iter().copied()))
            .order_by_desc(activity::Column::CreatedAt)
            .order_by_desc(activity::Column::Id);

        if let Some(cursor) = cursor {
            query = query.filter(cursor.condition());
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Same selection as [`Self::find_recent`], hydrated in one statement.
    ///
    /// Actor and recipe are inner-joined, so rows whose actor or recipe no
    /// longer resolves are dropped. Comment text is left-joined.
    pub async fn find_feed(
        &self,
        actor_ids: &[i64],
        limit: u64,
        cursor: Option<FeedCursor>,
    ) -> AppResult<Vec<FeedRow>> {
        if actor_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = Activity::find()
            .select_only()
            .columns([
                activity::Column::Id,
                activity::Column::ActorId,
                activity::Column::ActivityType,
                activity::Column::RecipeId,
                activity::Column::CommentId,
                activity::Column::LikeId,
                activity::Column::BookmarkId,
                activity::Column::Weight,
                activity::Column::CreatedAt,
            ])
            .column_as(user::Column::Name, "actor_name")
            .column_as(user::Column::AvatarUrl, "actor_avatar_url")
            .column_as(recipe::Column::Title, "recipe_title")
            .column_as(recipe::Column::ImageUrl, "recipe_image_url")
            .column_as(comment::Column::Text, "comment_text")
            .join(JoinType::InnerJoin, activity::Relation::Actor.def())
            .join(JoinType::InnerJoin, activity::Relation::Recipe.def())
            .join(JoinType::LeftJoin, activity::Relation::Comment.def())
            .filter(activity::Column::ActorId.is_in(actor_ids.iter().copied()))
            .order_by_desc(activity::Column::CreatedAt)
            .order_by_desc(activity::Column::Id);

        if let Some(cursor) = cursor {
            query = query.filter(cursor.condition());
        }

        query
            .limit(limit)
            .into_model::<FeedRow>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    fn ts(secs: i64) -> DateTime<FixedOffset> {
        Utc.timestamp_opt(secs, 0).unwrap().fixed_offset()
    }

    #[test]
    fn test_cursor_wire_format() {
        let cursor = FeedCursor::new(ts(1_700_000_000), 42);
        let encoded = cursor.to_string();

        assert_eq!(encoded, "1700000000000000_42");
        assert_eq!(encoded.parse::<FeedCursor>().unwrap(), cursor);
    }

    #[test]
    fn test_malformed_cursor_is_bad_request() {
        for raw in ["", "abc", "123", "12_x", "x_12"] {
            let result = raw.parse::<FeedCursor>();
            assert!(
                matches!(result, Err(AppError::BadRequest(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_find_recent_with_no_actors_skips_query() {
        // No query results are queued: any statement would fail.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = ActivityRepository::new(db);

        assert!(repo.find_recent(&[], 20, None).await.unwrap().is_empty());
        assert!(repo.find_feed(&[], 20, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_recent_orders_by_time_then_id() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<activity::Model>::new()])
                .into_connection(),
        );

        let repo = ActivityRepository::new(db.clone());
        repo.find_recent(&[2, 3], 20, Some(FeedCursor::new(ts(100), 7)))
            .await
            .unwrap();
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
        let sql = &log[0].statements()[0].sql;
        assert!(sql.contains(r#"ORDER BY "activity"."created_at" DESC, "activity"."id" DESC"#));
        assert!(sql.contains(r#""activity"."actor_id" IN"#));
        assert!(sql.contains(r#""activity"."created_at" < "#));
    }

    #[tokio::test]
    async fn test_find_feed_joins_and_breaks_ties_on_id() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<std::collections::BTreeMap<&str, Value>>::new()])
                .into_connection(),
        );

        let repo = ActivityRepository::new(db.clone());
        let rows = repo
            .find_feed(&[2, 3], 20, Some(FeedCursor::new(ts(100), 7)))
            .await
            .unwrap();
        assert!(rows.is_empty());
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
        let statement = &log[0].statements()[0];
        let sql = &statement.sql;

        assert!(sql.contains(r#"INNER JOIN "user""#), "{sql}");
        assert!(sql.contains(r#"INNER JOIN "recipe""#), "{sql}");
        assert!(sql.contains(r#"LEFT JOIN "comment""#), "{sql}");
        assert!(sql.contains(r#""activity"."created_at" < $"#), "{sql}");
        assert!(sql.contains(r#""activity"."created_at" = $"#), "{sql}");
        assert!(sql.contains(r#""activity"."id" < $"#), "{sql}");
        assert!(sql.contains(r#"ORDER BY "activity"."created_at" DESC, "activity"."id" DESC"#));

        let values = &statement.values.as_ref().unwrap().0;
        assert!(values.contains(&Value::BigInt(Some(7))));
    }

    #[tokio::test]
    async fn test_find_feed_hydrates_rows() {
        let row = btreemap! {
            "id" => Into::<Value>::into(11i64),
            "actor_id" => Into::<Value>::into(2i64),
            "activity_type" => Into::<Value>::into("comment"),
            "recipe_id" => Into::<Value>::into(5i64),
            "comment_id" => Into::<Value>::into(Some(9i64)),
            "like_id" => Into::<Value>::into(Option::<i64>::None),
            "bookmark_id" => Into::<Value>::into(Option::<i64>::None),
            "weight" => Into::<Value>::into(1i32),
            "created_at" => Into::<Value>::into(ts(200)),
            "actor_name" => Into::<Value>::into("Bob"),
            "actor_avatar_url" => Into::<Value>::into(Option::<String>::None),
            "recipe_title" => Into::<Value>::into("Pancakes"),
            "recipe_image_url" => Into::<Value>::into(Some("https://img/p.png".to_string())),
            "comment_text" => Into::<Value>::into(Some("Yum".to_string())),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![row]])
                .into_connection(),
        );

        let repo = ActivityRepository::new(db);
        let rows = repo.find_feed(&[2], 20, None).await.unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.activity_type, ActivityType::Comment);
        assert_eq!(row.actor_name, "Bob");
        assert_eq!(row.recipe_title, "Pancakes");
        assert_eq!(row.comment_text.as_deref(), Some("Yum"));
        assert_eq!(row.cursor().to_string(), "200000000_11");
    }
}
