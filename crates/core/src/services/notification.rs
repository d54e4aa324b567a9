//! Notification service.
//!
//! Turns recorded activities into notification rows and best-effort realtime
//! pushes, and serves a user's notification inbox.

use chrono::{DateTime, FixedOffset, Utc};
use futures::stream::{self, StreamExt};
use recipebox_common::AppResult;
use recipebox_db::{
    entities::{
        activity::{self, ActivityType},
        notification::{self, NotificationType},
        recipe, user,
    },
    repositories::{
        FollowingRepository, NotificationRepository, NotificationRow, RecipeRepository,
        UserRepository,
    },
};
use sea_orm::{NotSet, Set};
use serde::Serialize;

use crate::services::event_publisher::{EventPublisherService, StreamEvent};

/// Default number of notification writes in flight per activity.
pub const DEFAULT_FANOUT_CONCURRENCY: usize = 8;

/// Outcome of dispatching one activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Notification rows written.
    pub created: usize,
    /// Notification rows that failed to write.
    pub failed: usize,
    /// Notifications delivered to at least one live connection.
    pub pushed: usize,
}

/// User who triggered a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationActor {
    /// Actor's user ID.
    pub user_id: i64,
    /// Display name.
    pub name: String,
}

/// Recipe a notification refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecipe {
    /// Recipe ID.
    pub recipe_id: i64,
    /// Recipe title.
    pub title: String,
}

/// Notification as returned to clients and pushed over the realtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    /// Notification ID.
    pub id: i64,
    /// Kind of activity that produced it.
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    /// Whether the recipient has marked it read.
    pub is_read: bool,
    /// Creation time.
    pub created_at: DateTime<FixedOffset>,
    /// User who triggered it.
    pub from_user: NotificationActor,
    /// `None` once the recipe has been deleted.
    pub recipe: Option<NotificationRecipe>,
}

impl NotificationView {
    fn created(row: &notification::Model, actor: &user::Model, recipe: &recipe::Model) -> Self {
        Self {
            id: row.id,
            notification_type: row.notification_type,
            is_read: row.is_read,
            created_at: row.created_at,
            from_user: NotificationActor {
                user_id: actor.id,
                name: actor.name.clone(),
            },
            recipe: Some(NotificationRecipe {
                recipe_id: recipe.id,
                title: recipe.title.clone(),
            }),
        }
    }
}

impl From<NotificationRow> for NotificationView {
    fn from(row: NotificationRow) -> Self {
        let recipe = match (row.recipe_id, row.recipe_title) {
            (Some(recipe_id), Some(title)) => Some(NotificationRecipe { recipe_id, title }),
            _ => None,
        };

        Self {
            id: row.id,
            notification_type: row.notification_type,
            is_read: row.is_read,
            created_at: row.created_at,
            from_user: NotificationActor {
                user_id: row.actor_id,
                name: row.actor_name,
            },
            recipe,
        }
    }
}

enum Delivery {
    Created { pushed: bool },
    Failed,
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    recipe_repo: RecipeRepository,
    user_repo: UserRepository,
    following_repo: FollowingRepository,
    event_publisher: Option<EventPublisherService>,
    concurrency: usize,
    broadcast_on_list: bool,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(
        notification_repo: NotificationRepository,
        recipe_repo: RecipeRepository,
        user_repo: UserRepository,
        following_repo: FollowingRepository,
    ) -> Self {
        Self {
            notification_repo,
            recipe_repo,
            user_repo,
            following_repo,
            event_publisher: None,
            concurrency: DEFAULT_FANOUT_CONCURRENCY,
            broadcast_on_list: true,
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Set how many notification writes may run at once for one activity.
    pub fn set_concurrency(&mut self, concurrency: usize) {
        self.concurrency = concurrency.max(1);
    }

    /// Whether [`Self::list_for_recipient`] also pushes the list to the
    /// caller's room.
    pub fn set_broadcast_on_list(&mut self, enabled: bool) {
        self.broadcast_on_list = enabled;
    }

    /// Dispatch notifications for a recorded activity.
    ///
    /// Recipients are the recipe owner for likes, comments and bookmarks, and
    /// every follower of the actor for new recipes. The actor never notifies
    /// themselves. A failed row write is logged and counted; the remaining
    /// recipients are still served.
    pub async fn on_activity(&self, activity: &activity::Model) -> AppResult<DispatchReport> {
        let Some(recipe) = self.recipe_repo.find_by_id(activity.recipe_id).await? else {
            tracing::debug!(activity_id = activity.id, "Recipe gone before dispatch");
            return Ok(DispatchReport::default());
        };
        let Some(actor) = self.user_repo.find_by_id(activity.actor_id).await? else {
            tracing::debug!(activity_id = activity.id, "Actor gone before dispatch");
            return Ok(DispatchReport::default());
        };

        let recipients = self.resolve_recipients(activity, &recipe).await?;

        let outcomes: Vec<Delivery> = stream::iter(recipients)
            .map(|recipient_id| self.deliver(activity, &actor, &recipe, recipient_id))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = DispatchReport::default();
        for outcome in outcomes {
            match outcome {
                Delivery::Created { pushed } => {
                    report.created += 1;
                    if pushed {
                        report.pushed += 1;
                    }
                }
                Delivery::Failed => report.failed += 1,
            }
        }

        tracing::info!(
            activity_id = activity.id,
            kind = activity.activity_type.as_str(),
            created = report.created,
            failed = report.failed,
            pushed = report.pushed,
            "Notifications dispatched"
        );

        Ok(report)
    }

    async fn resolve_recipients(
        &self,
        activity: &activity::Model,
        recipe: &recipe::Model,
    ) -> AppResult<Vec<i64>> {
        let mut recipients = match activity.activity_type {
            ActivityType::NewRecipe => {
                self.following_repo
                    .find_follower_ids(activity.actor_id)
                    .await?
            }
            ActivityType::Like | ActivityType::Comment | ActivityType::Bookmark => {
                vec![recipe.user_id]
            }
        };

        recipients.retain(|&id| id != activity.actor_id);
        recipients.sort_unstable();
        recipients.dedup();

        Ok(recipients)
    }

    async fn deliver(
        &self,
        activity: &activity::Model,
        actor: &user::Model,
        recipe: &recipe::Model,
        recipient_id: i64,
    ) -> Delivery {
        let model = notification::ActiveModel {
            id: NotSet,
            recipient_id: Set(recipient_id),
            actor_id: Set(actor.id),
            notification_type: Set(activity.activity_type.into()),
            recipe_id: Set(Some(recipe.id)),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let created = match self.notification_repo.create(model).await {
            Ok(created) => created,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    activity_id = activity.id,
                    recipient_id,
                    "Failed to create notification"
                );
                return Delivery::Failed;
            }
        };

        let view = NotificationView::created(&created, actor, recipe);
        let pushed = self
            .push(recipient_id, StreamEvent::NotificationCreated, &view)
            .await;

        Delivery::Created { pushed }
    }

    /// Best-effort push; returns whether any connection was reached.
    async fn push<T: Serialize + Sync>(&self, user_id: i64, event: StreamEvent, body: &T) -> bool {
        let Some(ref event_publisher) = self.event_publisher else {
            return false;
        };

        let payload = match serde_json::to_value(body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize realtime payload");
                return false;
            }
        };

        match event_publisher.publish_to_user(user_id, event, payload).await {
            Ok(reached) => reached > 0,
            Err(e) => {
                tracing::warn!(error = %e, user_id, event = event.as_str(), "Failed to publish event");
                false
            }
        }
    }

    /// Fire-and-forget variant of [`Self::push`] for read paths.
    fn spawn_push<T: Serialize>(&self, user_id: i64, event: StreamEvent, body: &T) {
        let Some(event_publisher) = self.event_publisher.clone() else {
            return;
        };

        let payload = match serde_json::to_value(body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize realtime payload");
                return;
            }
        };

        tokio::spawn(async move {
            if let Err(e) = event_publisher.publish_to_user(user_id, event, payload).await {
                tracing::warn!(error = %e, user_id, event = event.as_str(), "Failed to publish event");
            }
        });
    }

    /// All of a user's notifications, newest first.
    ///
    /// When broadcasting on list is enabled, the same list is also pushed to
    /// the user's room as `newNotification` without waiting for delivery.
    pub async fn list_for_recipient(&self, user_id: i64) -> AppResult<Vec<NotificationView>> {
        let views: Vec<NotificationView> = self
            .notification_repo
            .find_with_details(user_id)
            .await?
            .into_iter()
            .map(NotificationView::from)
            .collect();

        if self.broadcast_on_list {
            self.spawn_push(user_id, StreamEvent::NewNotification, &views);
        }

        Ok(views)
    }

    /// Mark every unread notification as read; returns how many flipped.
    pub async fn mark_all_read(&self, user_id: i64) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }

    /// Count unread notifications.
    pub async fn count_unread(&self, user_id: i64) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }
}
