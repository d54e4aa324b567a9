//! Activity log service.
//!
//! Every like, comment, bookmark and new recipe is mirrored here after its
//! primary row is written. Recorded activities are handed to the fan-out
//! queue, if one is attached, for notification dispatch.

use chrono::Utc;
use recipebox_common::{AppError, AppResult, ErrorLog};
use recipebox_db::{
    entities::activity::{self, ActivityType},
    repositories::{ActivityRepository, FeedCursor, RecipeRepository},
};
use sea_orm::{NotSet, Set};

use crate::services::fanout::FanoutSender;

/// Default ranking weight.
pub const DEFAULT_WEIGHT: i32 = 1;

/// Row that produced an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubEntity {
    /// The recipe itself.
    #[default]
    None,
    /// Comment ID.
    Comment(i64),
    /// Like ID.
    Like(i64),
    /// Bookmark ID.
    Bookmark(i64),
}

impl SubEntity {
    /// Whether this reference may accompany an activity of `kind`.
    ///
    /// `new_recipe` carries no reference; the others carry their own kind or
    /// nothing.
    #[must_use]
    pub const fn matches(self, kind: ActivityType) -> bool {
        matches!(
            (kind, self),
            (_, Self::None)
                | (ActivityType::Comment, Self::Comment(_))
                | (ActivityType::Like, Self::Like(_))
                | (ActivityType::Bookmark, Self::Bookmark(_))
        )
    }
}

/// Activity service for business logic.
#[derive(Clone)]
pub struct ActivityService {
    activity_repo: ActivityRepository,
    recipe_repo: RecipeRepository,
    fanout: Option<FanoutSender>,
    error_log: Option<ErrorLog>,
}

impl ActivityService {
    /// Create a new activity service.
    #[must_use]
    pub const fn new(activity_repo: ActivityRepository, recipe_repo: RecipeRepository) -> Self {
        Self {
            activity_repo,
            recipe_repo,
            fanout: None,
            error_log: None,
        }
    }

    /// Attach the fan-out queue.
    pub fn set_fanout(&mut self, fanout: FanoutSender) {
        self.fanout = Some(fanout);
    }

    /// Attach the error log that receives failed [`Self::mirror`] writes.
    pub fn set_error_log(&mut self, error_log: ErrorLog) {
        self.error_log = Some(error_log);
    }

    /// Record the activity for a primary row that is already committed.
    ///
    /// The caller's action has succeeded at this point, so a failure here
    /// is logged and recorded instead of returned.
    pub async fn mirror(
        &self,
        actor_id: i64,
        kind: ActivityType,
        recipe_id: i64,
        sub_entity: SubEntity,
    ) -> Option<activity::Model> {
        match self.record(actor_id, kind, recipe_id, sub_entity).await {
            Ok(activity) => Some(activity),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    actor_id,
                    recipe_id,
                    kind = kind.as_str(),
                    "Failed to record activity"
                );
                if let Some(ref error_log) = self.error_log {
                    error_log.record(
                        "activity",
                        format!("{} by user {actor_id} on recipe {recipe_id}: {e}", kind.as_str()),
                    );
                }
                None
            }
        }
    }

    /// Record an activity with the default weight.
    pub async fn record(
        &self,
        actor_id: i64,
        kind: ActivityType,
        recipe_id: i64,
        sub_entity: SubEntity,
    ) -> AppResult<activity::Model> {
        self.record_weighted(actor_id, kind, recipe_id, sub_entity, DEFAULT_WEIGHT)
            .await
    }

    /// Record an activity.
    pub async fn record_weighted(
        &self,
        actor_id: i64,
        kind: ActivityType,
        recipe_id: i64,
        sub_entity: SubEntity,
        weight: i32,
    ) -> AppResult<activity::Model> {
        if !sub_entity.matches(kind) {
            return Err(AppError::InvalidOperation(format!(
                "{sub_entity:?} cannot be attached to a {} activity",
                kind.as_str()
            )));
        }

        self.recipe_repo.get_by_id(recipe_id).await?;

        let (comment_id, like_id, bookmark_id) = match sub_entity {
            SubEntity::None => (None, None, None),
            SubEntity::Comment(id) => (Some(id), None, None),
            SubEntity::Like(id) => (None, Some(id), None),
            SubEntity::Bookmark(id) => (None, None, Some(id)),
        };

        let model = activity::ActiveModel {
            id: NotSet,
            actor_id: Set(actor_id),
            activity_type: Set(kind),
            recipe_id: Set(recipe_id),
            comment_id: Set(comment_id),
            like_id: Set(like_id),
            bookmark_id: Set(bookmark_id),
            weight: Set(weight),
            created_at: Set(Utc::now().into()),
        };

        let activity = self.activity_repo.create(model).await?;

        tracing::debug!(
            activity_id = activity.id,
            actor_id,
            recipe_id,
            kind = kind.as_str(),
            "Activity recorded"
        );

        if let Some(ref fanout) = self.fanout {
            fanout.enqueue(activity.clone());
        }

        Ok(activity)
    }

    /// Most recent activities by any of `actor_ids`, newest first.
    pub async fn query_recent(
        &self,
        actor_ids: &[i64],
        limit: u64,
        cursor: Option<FeedCursor>,
    ) -> AppResult<Vec<activity::Model>> {
        self.activity_repo
            .find_recent(actor_ids, limit, cursor)
            .await
    }
}
