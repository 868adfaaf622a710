//! Per-run audit record

use std::sync::Arc;
use std::time::Duration;

use core_library::models::{NewSyncLog, RunStatus};
use core_library::repositories::SyncLogRepository;
use tracing::{debug, error};

use crate::summary::SyncSummary;

/// Endpoint name recorded for full runs
pub const FULL_SYNC_ENDPOINT: &str = "sync_all";

/// Appends one `sync_logs` row per run
///
/// Writes go through the pool after the run's transaction has ended, so the
/// row survives a rollback.
pub struct RunLogger {
    repository: Arc<dyn SyncLogRepository>,
}

impl RunLogger {
    pub fn new(repository: Arc<dyn SyncLogRepository>) -> Self {
        Self { repository }
    }

    /// Record a finished run; never fails the caller
    pub async fn record_run(
        &self,
        endpoint: &str,
        status: RunStatus,
        summary: &SyncSummary,
        elapsed: Duration,
    ) {
        let message = match serde_json::to_string(summary) {
            Ok(json) => Some(json),
            Err(e) => {
                error!(error = %e, "Failed to serialize sync summary");
                summary.errors.first().cloned()
            }
        };

        let entry = NewSyncLog {
            endpoint: endpoint.to_string(),
            status,
            message,
            records_processed: summary.records_processed(),
            execution_time_ms: elapsed.as_millis().min(i64::MAX as u128) as i64,
        };

        match self.repository.append(&entry).await {
            Ok(id) => debug!(id, endpoint, status = %status, "Recorded sync run"),
            Err(e) => error!(endpoint, status = %status, error = %e, "Failed to record sync run"),
        }
    }
}
