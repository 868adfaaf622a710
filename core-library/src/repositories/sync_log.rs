//! Append-only sync run log

use crate::error::Result;
use crate::models::{NewSyncLog, SyncLogEntry};
use async_trait::async_trait;
use sqlx::{query_as, query_scalar, SqlitePool};

#[async_trait]
pub trait SyncLogRepository: Send + Sync {
    /// Append a row and return its id
    async fn append(&self, entry: &NewSyncLog) -> Result<i64>;

    /// Most recent rows first
    async fn recent(&self, limit: u32) -> Result<Vec<SyncLogEntry>>;

    /// Total rows
    async fn count(&self) -> Result<i64>;
}

pub struct SqliteSyncLogRepository {
    pool: SqlitePool,
}

impl SqliteSyncLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncLogRepository for SqliteSyncLogRepository {
    async fn append(&self, entry: &NewSyncLog) -> Result<i64> {
        let id = query_scalar::<_, i64>(
            r#"
            INSERT INTO sync_logs (endpoint, status, message, records_processed, execution_time_ms)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&entry.endpoint)
        .bind(entry.status.as_str())
        .bind(&entry.message)
        .bind(entry.records_processed)
        .bind(entry.execution_time_ms)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<SyncLogEntry>> {
        let entries = query_as::<_, SyncLogEntry>(
            "SELECT * FROM sync_logs ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn count(&self) -> Result<i64> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM sync_logs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
