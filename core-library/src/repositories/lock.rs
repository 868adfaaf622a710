//! Lease row that keeps two sync runs from overlapping

use crate::error::Result;
use async_trait::async_trait;
use sqlx::{query, query_scalar, SqlitePool};

#[async_trait]
pub trait SyncLockRepository: Send + Sync {
    /// Take the lease if it is free or expired
    ///
    /// Timestamps are unix seconds. Returns `false` when another owner holds
    /// an unexpired lease.
    async fn try_acquire(&self, name: &str, owner: &str, now: i64, ttl_secs: i64) -> Result<bool>;

    /// Push the expiry of an unexpired lease `owner` still holds
    ///
    /// Returns `false` when the lease was lost: expired (taken over or not)
    /// or released.
    async fn renew(&self, name: &str, owner: &str, now: i64, ttl_secs: i64) -> Result<bool>;

    /// Drop the lease if `owner` still holds it
    async fn release(&self, name: &str, owner: &str) -> Result<bool>;

    /// Current holder, if any
    async fn holder(&self, name: &str) -> Result<Option<String>>;
}

pub struct SqliteSyncLockRepository {
    pool: SqlitePool,
}

impl SqliteSyncLockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncLockRepository for SqliteSyncLockRepository {
    async fn try_acquire(&self, name: &str, owner: &str, now: i64, ttl_secs: i64) -> Result<bool> {
        let result = query(
            r#"
            INSERT INTO sync_lock (lock_name, owner, acquired_at, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(lock_name) DO UPDATE SET
                owner = excluded.owner,
                acquired_at = excluded.acquired_at,
                expires_at = excluded.expires_at
            WHERE sync_lock.expires_at <= excluded.acquired_at
            "#,
        )
        .bind(name)
        .bind(owner)
        .bind(now)
        .bind(now + ttl_secs)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn renew(&self, name: &str, owner: &str, now: i64, ttl_secs: i64) -> Result<bool> {
        let result = query(
            "UPDATE sync_lock SET expires_at = ? WHERE lock_name = ? AND owner = ? AND expires_at > ?",
        )
        .bind(now + ttl_secs)
        .bind(name)
        .bind(owner)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn release(&self, name: &str, owner: &str) -> Result<bool> {
        let result = query("DELETE FROM sync_lock WHERE lock_name = ? AND owner = ?")
            .bind(name)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn holder(&self, name: &str) -> Result<Option<String>> {
        let owner = query_scalar::<_, String>("SELECT owner FROM sync_lock WHERE lock_name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(owner)
    }
}
