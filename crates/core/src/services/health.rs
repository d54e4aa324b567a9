//! Health reporting service.

use std::sync::Arc;

use recipebox_common::{ErrorEntry, ErrorLog};
use sea_orm::DatabaseConnection;
use serde::Serialize;

/// Snapshot returned by the health endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// `ok` or `unavailable`.
    pub status: &'static str,
    /// `up` or `down`.
    pub database: &'static str,
    /// Newest failures first.
    pub recent_errors: Vec<ErrorEntry>,
}

impl HealthReport {
    /// Whether every dependency answered.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "ok"
    }
}

/// Health service.
#[derive(Clone)]
pub struct HealthService {
    db: Arc<DatabaseConnection>,
    error_log: ErrorLog,
}

impl HealthService {
    /// Create a new health service.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, error_log: ErrorLog) -> Self {
        Self { db, error_log }
    }

    /// Ping the database and collect recently recorded failures.
    pub async fn check(&self) -> HealthReport {
        let database_up = match self.db.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Database ping failed");
                false
            }
        };

        HealthReport {
            status: if database_up { "ok" } else { "unavailable" },
            database: if database_up { "up" } else { "down" },
            recent_errors: self.error_log.recent(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_report_includes_recent_errors() {
        let errors = ErrorLog::new(5);
        errors.record("fanout", "activity 1: database error");

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = HealthService::new(db, errors);

        let report = service.check().await;

        assert!(report.is_healthy());
        assert_eq!(report.database, "up");
        assert_eq!(report.recent_errors.len(), 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["recentErrors"][0]["source"], "fanout");
    }
}
