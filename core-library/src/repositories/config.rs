//! Key/value configuration repository

use crate::error::Result;
use crate::models::ConfigEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, query_scalar, SqlitePool};

/// Well-known configuration keys
pub mod keys {
    pub const CURRENT_SEASON: &str = "current_season";
    pub const LAST_SYNC_CLUB: &str = "last_sync_club";
    pub const LAST_SYNC_TEAMS: &str = "last_sync_teams";
    pub const LAST_SYNC_CALENDAR: &str = "last_sync_calendar";
    pub const LAST_SYNC_RESULTS: &str = "last_sync_results";
    pub const LAST_SYNC_STANDINGS: &str = "last_sync_standings";
}

/// Format a timestamp the way the store keeps them: UTC `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Read a value, `None` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite a value, stamping `updated_at` with `at`
    async fn set(&self, key: &str, value: &str, at: DateTime<Utc>) -> Result<()>;

    /// All entries ordered by key
    async fn entries(&self) -> Result<Vec<ConfigEntry>>;

    /// Read a value as an integer, ignoring values that do not parse
    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.get(key).await?.and_then(|v| v.trim().parse().ok()))
    }
}

/// SQLite implementation of ConfigRepository
pub struct SqliteConfigRepository {
    pool: SqlitePool,
}

impl SqliteConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigRepository for SqliteConfigRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = query_scalar::<_, String>("SELECT config_value FROM config WHERE config_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, at: DateTime<Utc>) -> Result<()> {
        query(
            r#"
            INSERT INTO config (config_key, config_value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(config_key) DO UPDATE SET
                config_value = excluded.config_value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(format_timestamp(at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn entries(&self) -> Result<Vec<ConfigEntry>> {
        let entries = query_as::<_, ConfigEntry>("SELECT * FROM config ORDER BY config_key")
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let repo = SqliteConfigRepository::new(create_test_pool().await.unwrap());
        assert_eq!(repo.get(keys::CURRENT_SEASON).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let repo = SqliteConfigRepository::new(create_test_pool().await.unwrap());
        let first = Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2025, 9, 2, 8, 30, 15).unwrap();

        repo.set(keys::LAST_SYNC_CLUB, "2025-09-01 08:00:00", first).await.unwrap();
        repo.set(keys::LAST_SYNC_CLUB, "2025-09-02 08:30:15", second).await.unwrap();

        let entries = repo.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].config_value, "2025-09-02 08:30:15");
        assert_eq!(entries[0].updated_at, "2025-09-02 08:30:15");
    }

    #[tokio::test]
    async fn test_get_i64() {
        let repo = SqliteConfigRepository::new(create_test_pool().await.unwrap());
        let now = Utc::now();

        repo.set(keys::CURRENT_SEASON, "2025", now).await.unwrap();
        assert_eq!(repo.get_i64(keys::CURRENT_SEASON).await.unwrap(), Some(2025));

        repo.set(keys::CURRENT_SEASON, "next", now).await.unwrap();
        assert_eq!(repo.get_i64(keys::CURRENT_SEASON).await.unwrap(), None);
    }

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 1, 5, 7, 3, 9).unwrap();
        assert_eq!(format_timestamp(at), "2025-01-05 07:03:09");
    }
}
