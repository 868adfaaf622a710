//! Core service façade and bootstrap helpers.
//!
//! This crate wires the configuration, the SQLite store, the federation
//! connector and the sync orchestrator together. Native hosts enable the
//! `native` feature (the default), which brings in `bridge-native` for HTTP
//! and builds the `club-sync` binary.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::federation::FederationSource;
use bridge_traits::http::RetryPolicy;
use core_library::db::{create_pool, DatabaseConfig};
use core_library::models::SyncLogEntry;
use core_library::repositories::{SqliteSyncLogRepository, SyncLogRepository};
use core_runtime::logging::strip_path;
use core_runtime::CoreConfig;
use core_sync::{SyncError, SyncOrchestrator, SyncSettings, SyncSummary};
use provider_fff::FffSettings;
use sqlx::SqlitePool;
use tracing::{info, warn};

pub use core_sync::SyncCategory;

/// Connector settings derived from the core configuration
///
/// The engagement fan-out of the connector shares the `pools` batch limit.
pub fn connector_settings(config: &CoreConfig) -> FffSettings {
    let retry = RetryPolicy {
        max_attempts: config.api.retry_attempts,
        base_delay: config.api.retry_delay(),
        ..RetryPolicy::default()
    };

    FffSettings::new(config.api.base_url.clone(), config.club_number)
        .with_timeout(config.api.timeout())
        .with_retry(retry)
        .with_max_pages(config.api.max_pages)
        .with_max_engagements(config.sync.batch_limits.pools)
}

/// Open the store described by the configuration, running migrations
pub async fn open_store(config: &CoreConfig) -> Result<SqlitePool> {
    let path = config.database_path.to_string_lossy().to_string();
    info!(database = %strip_path(&path), "Opening club store");

    let pool = create_pool(DatabaseConfig::new(&config.database_path)).await?;
    Ok(pool)
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: CoreConfig,
    pool: SqlitePool,
    orchestrator: Arc<SyncOrchestrator>,
}

impl CoreService {
    /// Assemble a service from an open pool and a federation source.
    pub fn from_parts(config: CoreConfig, pool: SqlitePool, source: Arc<dyn FederationSource>) -> Self {
        let orchestrator = SyncOrchestrator::new(pool.clone(), source, SyncSettings::from_config(&config));
        Self {
            config,
            pool,
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Open the configured store and sync from the given source.
    pub async fn with_source(config: CoreConfig, source: Arc<dyn FederationSource>) -> Result<Self> {
        let pool = open_store(&config).await?;
        Ok(Self::from_parts(config, pool, source))
    }

    /// Wire the production stack: reqwest HTTP client and FFF connector.
    #[cfg(feature = "native")]
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        use bridge_native::ReqwestHttpClient;
        use provider_fff::FffConnector;

        let http = ReqwestHttpClient::with_timeout(config.api.timeout())
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
        let connector = FffConnector::new(Arc::new(http), connector_settings(&config));

        info!(
            club_number = config.club_number,
            season = config.current_season,
            base_url = %config.api.base_url,
            "Club sync service ready"
        );
        Self::with_source(config, Arc::new(connector)).await
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run one full sync.
    ///
    /// # Errors
    ///
    /// `SyncError::Disabled` when sync is switched off in the configuration.
    /// Sync failures themselves are reported in the returned summary.
    pub async fn run_sync(&self) -> Result<SyncSummary> {
        if !self.config.sync.enabled {
            warn!("Sync is disabled, skipping run");
            return Err(SyncError::Disabled.into());
        }

        Ok(self.orchestrator.run_full_sync().await)
    }

    /// Last successful sync time of a category.
    pub async fn last_synced(&self, category: SyncCategory) -> Result<Option<String>> {
        Ok(self.orchestrator.last_synced(category).await?)
    }

    /// Most recent run log rows.
    pub async fn recent_runs(&self, limit: u32) -> Result<Vec<SyncLogEntry>> {
        let repository = SqliteSyncLogRepository::new(self.pool.clone());
        Ok(repository.recent(limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::federation::{ClubRecord, MatchRecord, StandingRecord, TeamRecord};
    use core_library::db::create_test_pool;
    use core_runtime::BatchLimits;
    use mockall::mock;
    use std::time::Duration;

    mock! {
        Source {}

        #[async_trait]
        impl FederationSource for Source {
            async fn fetch_club(&self) -> bridge_traits::error::Result<ClubRecord>;
            async fn fetch_teams(&self) -> bridge_traits::error::Result<Vec<TeamRecord>>;
            async fn fetch_matches(&self) -> bridge_traits::error::Result<Vec<MatchRecord>>;
            async fn fetch_standings(&self) -> bridge_traits::error::Result<Vec<StandingRecord>>;
        }
    }

    fn config(enabled: bool) -> CoreConfig {
        CoreConfig::builder()
            .database_path("/tmp/club.db")
            .api_base_url("https://api.test/api/")
            .http_timeout_secs(12)
            .retry_attempts(5)
            .max_pages(7)
            .batch_limits(BatchLimits {
                pools: 9,
                ..BatchLimits::default()
            })
            .enabled(enabled)
            .build()
            .unwrap()
    }

    fn empty_source() -> MockSource {
        let mut source = MockSource::new();
        source.expect_fetch_club().returning(|| {
            Ok(ClubRecord {
                cl_no: Some(5403),
                name: Some("ES Val".to_string()),
                ..ClubRecord::default()
            })
        });
        source.expect_fetch_teams().returning(|| Ok(vec![]));
        source.expect_fetch_matches().returning(|| Ok(vec![]));
        source.expect_fetch_standings().returning(|| Ok(vec![]));
        source
    }

    #[test]
    fn test_connector_settings_follow_config() {
        let settings = connector_settings(&config(true));

        assert_eq!(settings.base_url, "https://api.test/api");
        assert_eq!(settings.club_number, 5403);
        assert_eq!(settings.timeout, Duration::from_secs(12));
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.max_pages, 7);
        assert_eq!(settings.max_engagements, 9);
    }

    #[tokio::test]
    async fn test_run_sync_records_run() {
        let pool = create_test_pool().await.unwrap();
        let service = CoreService::from_parts(config(true), pool, Arc::new(empty_source()));

        let summary = service.run_sync().await.unwrap();

        assert!(summary.success);
        assert!(summary.club_synced);
        let runs = service.recent_runs(5).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, "success");
        assert!(service.last_synced(SyncCategory::Club).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_disabled_sync_is_refused() {
        let pool = create_test_pool().await.unwrap();
        let mut source = MockSource::new();
        source.expect_fetch_club().never();
        let service = CoreService::from_parts(config(false), pool, Arc::new(source));

        let result = service.run_sync().await;

        assert!(matches!(result, Err(CoreError::Sync(SyncError::Disabled))));
        assert!(service.recent_runs(5).await.unwrap().is_empty());
    }
}
