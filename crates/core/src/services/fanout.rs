//! In-process fan-out queue.
//!
//! Domain services enqueue an activity once its primary write has committed.
//! A single spawned worker owns the receiving end and runs the notification
//! dispatcher for each activity, so neither the HTTP response nor a dropped
//! request can hold up or cancel notification writes. Failures are logged
//! and recorded in the shared [`ErrorLog`].

use recipebox_common::ErrorLog;
use recipebox_db::entities::activity;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::services::notification::NotificationService;

const SOURCE: &str = "fanout";

/// Cloneable handle for enqueueing activities.
#[derive(Clone)]
pub struct FanoutSender {
    sender: mpsc::Sender<activity::Model>,
    error_log: ErrorLog,
}

impl FanoutSender {
    pub(crate) fn channel(
        buffer: usize,
        error_log: ErrorLog,
    ) -> (Self, mpsc::Receiver<activity::Model>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender, error_log }, receiver)
    }

    /// Hand an activity to the worker without waiting.
    ///
    /// Returns `false` when the queue is full or the worker has stopped; the
    /// activity is then dropped and the failure recorded.
    pub fn enqueue(&self, activity: activity::Model) -> bool {
        match self.sender.try_send(activity) {
            Ok(()) => true,
            Err(TrySendError::Full(activity)) => {
                warn!(activity_id = activity.id, "Fan-out queue full, activity dropped");
                self.error_log.record(
                    SOURCE,
                    format!("queue full, activity {} not dispatched", activity.id),
                );
                false
            }
            Err(TrySendError::Closed(activity)) => {
                warn!(activity_id = activity.id, "Fan-out worker stopped, activity dropped");
                self.error_log.record(
                    SOURCE,
                    format!("worker stopped, activity {} not dispatched", activity.id),
                );
                false
            }
        }
    }
}

/// Fan-out queue, consumed by [`FanoutQueue::start`].
pub struct FanoutQueue {
    sender: FanoutSender,
    receiver: mpsc::Receiver<activity::Model>,
}

impl FanoutQueue {
    /// Create a queue holding at most `buffer` pending activities.
    #[must_use]
    pub fn new(buffer: usize, error_log: ErrorLog) -> Self {
        let (sender, receiver) = FanoutSender::channel(buffer, error_log);
        Self { sender, receiver }
    }

    /// Get a sender for enqueueing activities.
    #[must_use]
    pub fn sender(&self) -> FanoutSender {
        self.sender.clone()
    }

    /// Spawn the worker.
    ///
    /// The worker exits after every [`FanoutSender`] has been dropped and the
    /// remaining queued activities have been dispatched; await the returned
    /// handle to drain on shutdown.
    pub fn start(self, dispatcher: NotificationService) -> JoinHandle<()> {
        let Self { sender, receiver } = self;
        let error_log = sender.error_log.clone();
        drop(sender);

        tokio::spawn(async move {
            info!("Fan-out worker starting");
            run_worker(receiver, dispatcher, error_log).await;
            info!("Fan-out worker stopped");
        })
    }
}

async fn run_worker(
    mut receiver: mpsc::Receiver<activity::Model>,
    dispatcher: NotificationService,
    error_log: ErrorLog,
) {
    while let Some(activity) = receiver.recv().await {
        dispatch(&dispatcher, &error_log, &activity).await;
    }
}

async fn dispatch(dispatcher: &NotificationService, error_log: &ErrorLog, activity: &activity::Model) {
    match dispatcher.on_activity(activity).await {
        Ok(report) => {
            if report.failed > 0 {
                error_log.record(
                    SOURCE,
                    format!(
                        "{} of {} notifications for activity {} failed",
                        report.failed,
                        report.failed + report.created,
                        activity.id
                    ),
                );
            }
            debug!(
                activity_id = activity.id,
                created = report.created,
                failed = report.failed,
                pushed = report.pushed,
                "Activity dispatched"
            );
        }
        Err(e) => {
            error!(activity_id = activity.id, error = %e, "Failed to dispatch activity");
            error_log.record(SOURCE, format!("activity {}: {e}", activity.id));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use recipebox_db::entities::activity::ActivityType;
    use recipebox_db::repositories::{
        FollowingRepository, NotificationRepository, RecipeRepository, UserRepository,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_activity(id: i64) -> activity::Model {
        activity::Model {
            id,
            actor_id: 1,
            activity_type: ActivityType::NewRecipe,
            recipe_id: 3,
            comment_id: None,
            like_id: None,
            bookmark_id: None,
            weight: 1,
            created_at: Utc::now().into(),
        }
    }

    fn unreachable_dispatcher() -> NotificationService {
        // Mocks with nothing queued: every lookup fails.
        let conn = || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        NotificationService::new(
            NotificationRepository::new(conn()),
            RecipeRepository::new(conn()),
            UserRepository::new(conn()),
            FollowingRepository::new(conn()),
        )
    }

    #[tokio::test]
    async fn test_enqueue_on_full_queue_is_recorded() {
        let errors = ErrorLog::new(10);
        let queue = FanoutQueue::new(1, errors.clone());
        let sender = queue.sender();

        assert!(sender.enqueue(create_test_activity(1)));
        assert!(!sender.enqueue(create_test_activity(2)));

        assert_eq!(errors.len(), 1);
        assert!(errors.recent()[0].message.contains("activity 2"));
    }

    #[tokio::test]
    async fn test_worker_drains_and_records_failures() {
        let errors = ErrorLog::new(10);
        let queue = FanoutQueue::new(8, errors.clone());
        let sender = queue.sender();

        sender.enqueue(create_test_activity(1));
        sender.enqueue(create_test_activity(2));
        drop(sender);

        queue.start(unreachable_dispatcher()).await.unwrap();

        assert_eq!(errors.len(), 2);
        assert!(errors.recent().iter().all(|e| e.source == "fanout"));
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_stopped() {
        let errors = ErrorLog::new(10);
        let (sender, receiver) = FanoutSender::channel(4, errors.clone());
        drop(receiver);

        assert!(!sender.enqueue(create_test_activity(9)));
        assert!(errors.recent()[0].message.contains("worker stopped"));
    }
}
