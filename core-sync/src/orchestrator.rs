//! # Sync Orchestrator
//!
//! Drives one full synchronization of the tracked club.
//!
//! ## Workflow
//!
//! 1. Take the run lock; a contended run is refused and logged as `warning`
//! 2. Fetch club, teams, matches and standings, renewing the lease after
//!    each fetch
//! 3. Open one transaction
//! 4. Club identity, venues and members
//! 5. Team roster and engagements
//! 6. Every match, split into calendar and results, then the opponent cache
//! 7. League standings
//! 8. Commit, or roll back on the first error
//! 9. Stamp `last_sync_*` and `current_season` in the config table
//! 10. Release the lock and append one `sync_logs` row
//!
//! No network call happens while the transaction is open, so the write lock
//! is held only for database work and the lease can be renewed on the pool.
//! Steps 9 and 10 run on the pool after the transaction has ended, so a
//! rolled-back run still leaves its log row.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{SyncOrchestrator, SyncSettings};
//!
//! let settings = SyncSettings::from_config(&config);
//! let orchestrator = SyncOrchestrator::new(pool, source, settings);
//! let summary = orchestrator.run_full_sync().await;
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use bridge_traits::federation::{
    ClubRecord, FederationSource, MatchRecord, StandingRecord, TeamRecord,
};
use bridge_traits::time::{Clock, SystemClock};
use core_library::models::RunStatus;
use core_library::repositories::{
    format_timestamp, keys, ConfigRepository, SqliteConfigRepository, SqliteSyncLockRepository,
    SqliteSyncLogRepository,
};
use core_runtime::{BatchLimits, CoreConfig};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, error, info, instrument, warn, Span};

use crate::reconcile::{
    collect_opponents, partition_matches, reconcile_club, reconcile_matches, reconcile_members,
    reconcile_opponents, reconcile_standings, reconcile_teams, reconcile_venues,
};
use crate::run_lock::{RunLease, RunLock};
use crate::run_log::{RunLogger, FULL_SYNC_ENDPOINT};
use crate::summary::{SyncCategory, SyncSummary};
use crate::{Result, SyncError};

/// Explicit inputs of a sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// External number of the tracked club
    pub club_number: i64,
    /// Season applied when payloads omit one
    pub current_season: i64,
    pub batch_limits: BatchLimits,
    /// Lease duration of the run lock
    pub lock_ttl: Duration,
}

impl SyncSettings {
    pub fn new(club_number: i64, current_season: i64) -> Self {
        Self {
            club_number,
            current_season,
            batch_limits: BatchLimits::default(),
            lock_ttl: Duration::from_secs(300),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            club_number: config.club_number,
            current_season: config.current_season,
            batch_limits: config.sync.batch_limits,
            lock_ttl: Duration::from_secs(config.sync.lock_ttl_secs),
        }
    }

    pub fn with_batch_limits(mut self, limits: BatchLimits) -> Self {
        self.batch_limits = limits;
        self
    }

    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }
}

/// Everything one run reconciles
struct SourcePayload {
    club: ClubRecord,
    teams: Vec<TeamRecord>,
    matches: Vec<MatchRecord>,
    standings: Vec<StandingRecord>,
}

/// Full-sync driver
pub struct SyncOrchestrator {
    pool: SqlitePool,
    source: Arc<dyn FederationSource>,
    settings: SyncSettings,
    clock: Arc<dyn Clock>,
    config: Arc<dyn ConfigRepository>,
    run_lock: RunLock,
    run_logger: RunLogger,
}

impl SyncOrchestrator {
    pub fn new(pool: SqlitePool, source: Arc<dyn FederationSource>, settings: SyncSettings) -> Self {
        Self::with_clock(pool, source, settings, Arc::new(SystemClock))
    }

    /// Build with an explicit time source for lock leases and config stamps
    pub fn with_clock(
        pool: SqlitePool,
        source: Arc<dyn FederationSource>,
        settings: SyncSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let run_lock = RunLock::new(
            Arc::new(SqliteSyncLockRepository::new(pool.clone())),
            clock.clone(),
            settings.lock_ttl,
        );
        let run_logger = RunLogger::new(Arc::new(SqliteSyncLogRepository::new(pool.clone())));
        let config = Arc::new(SqliteConfigRepository::new(pool.clone()));

        Self {
            pool,
            source,
            settings,
            clock,
            config,
            run_lock,
            run_logger,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Last successful sync time of a category, as stored in the config table
    pub async fn last_synced(&self, category: SyncCategory) -> Result<Option<String>> {
        Ok(self.config.get(category.config_key()).await?)
    }

    /// Run one full synchronization
    ///
    /// Never returns an error: failures end up in the summary and in the run
    /// log row.
    #[instrument(
        skip(self),
        fields(
            club_number = self.settings.club_number,
            season = self.settings.current_season,
            run_id = tracing::field::Empty
        )
    )]
    pub async fn run_full_sync(&self) -> SyncSummary {
        let started = Instant::now();
        info!("Starting full sync");

        let lease = match self.run_lock.acquire().await {
            Ok(lease) => lease,
            Err(e) => {
                let status = match &e {
                    SyncError::SyncInProgress { .. } => RunStatus::Warning,
                    _ => RunStatus::Error,
                };
                warn!(error = %e, "Full sync not started");
                let summary = SyncSummary::failed(e.to_string());
                self.run_logger
                    .record_run(FULL_SYNC_ENDPOINT, status, &summary, started.elapsed())
                    .await;
                return summary;
            }
        };

        Span::current().record("run_id", lease.owner.as_str());

        let stale = self.source.drain_warnings();
        if !stale.is_empty() {
            debug!(count = stale.len(), "Discarded source warnings from an earlier run");
        }

        let mut summary = match self.sync(&lease).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, "Full sync failed, changes rolled back");
                SyncSummary::failed(e.to_string())
            }
        };

        if summary.success {
            self.stamp_run(&mut summary).await;
        }

        self.run_lock.release(lease).await;

        let elapsed = started.elapsed();
        let status = summary.status();
        self.run_logger
            .record_run(FULL_SYNC_ENDPOINT, status, &summary, elapsed)
            .await;

        info!(
            status = %status,
            records = summary.records_processed(),
            warnings = summary.warnings.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Full sync finished"
        );
        summary
    }

    async fn sync(&self, lease: &RunLease) -> Result<SyncSummary> {
        let payload = self.fetch_payload(lease).await?;
        let mut summary = self.reconcile_all(payload).await?;
        summary.extend_warnings(self.source.drain_warnings());
        Ok(summary)
    }

    /// Pull every payload of the run, keeping the lease alive in between
    async fn fetch_payload(&self, lease: &RunLease) -> Result<SourcePayload> {
        let club = self.source.fetch_club().await?;
        self.run_lock.renew(lease).await?;

        let teams = self.source.fetch_teams().await?;
        self.run_lock.renew(lease).await?;

        let matches = self.source.fetch_matches().await?;
        self.run_lock.renew(lease).await?;

        let standings = self.source.fetch_standings().await?;
        self.run_lock.renew(lease).await?;

        info!(
            teams = teams.len(),
            matches = matches.len(),
            standings = standings.len(),
            "Source payloads fetched"
        );
        Ok(SourcePayload {
            club,
            teams,
            matches,
            standings,
        })
    }

    async fn reconcile_all(&self, payload: SourcePayload) -> Result<SyncSummary> {
        let mut tx = self.pool.begin().await?;

        match self.reconcile_in(&mut tx, payload).await {
            Ok(summary) => {
                tx.commit().await?;
                Ok(summary)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn reconcile_in(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        payload: SourcePayload,
    ) -> Result<SyncSummary> {
        let club_number = self.settings.club_number;
        let season = self.settings.current_season;
        let limits = &self.settings.batch_limits;
        let mut summary = SyncSummary {
            success: true,
            ..SyncSummary::default()
        };

        let SourcePayload {
            club,
            teams,
            matches,
            standings,
        } = payload;

        let club_id = reconcile_club(tx, &club, club_number).await?;
        let venues = reconcile_venues(tx, club_id, &club.venues, limits).await?;
        let members = reconcile_members(tx, club_id, &club.members, limits).await?;
        summary.club_synced = true;
        summary.extend_warnings(venues.warnings);
        summary.extend_warnings(members.warnings);
        info!(venues = venues.processed, members = members.processed, "Club synced");

        let roster = reconcile_teams(tx, club_id, &teams, limits, season).await?;
        summary.teams = roster.teams.processed;
        info!(
            teams = roster.teams.processed,
            engagements = roster.engagements.processed,
            "Teams synced"
        );
        summary.extend_warnings(roster.teams.warnings);
        summary.extend_warnings(roster.engagements.warnings);

        let partition = partition_matches(matches);
        let calendar = reconcile_matches(tx, &partition.calendar, false, limits, season).await?;
        let results = reconcile_matches(tx, &partition.results, true, limits, season).await?;
        let opponents = collect_opponents(partition.all(), club_number);
        let cached = reconcile_opponents(tx, &opponents, limits).await?;
        summary.calendar = calendar.processed;
        summary.results = results.processed;
        summary.opponents = cached.processed;
        summary.extend_warnings(calendar.warnings);
        summary.extend_warnings(results.warnings);
        summary.extend_warnings(cached.warnings);
        info!(
            calendar = summary.calendar,
            results = summary.results,
            opponents = summary.opponents,
            "Matches synced"
        );

        let table = reconcile_standings(tx, &standings, limits, season).await?;
        summary.standings = table.processed;
        summary.extend_warnings(table.warnings);
        info!(standings = summary.standings, "Standings synced");

        Ok(summary)
    }

    /// Write after-commit run metadata; failures become warnings
    async fn stamp_run(&self, summary: &mut SyncSummary) {
        let now = self.clock.now();
        let stamp = format_timestamp(now);

        let mut writes: Vec<(&str, String)> = SyncCategory::ALL
            .iter()
            .map(|category| (category.config_key(), stamp.clone()))
            .collect();
        writes.push((keys::CURRENT_SEASON, self.settings.current_season.to_string()));

        for (key, value) in writes {
            if let Err(e) = self.config.set(key, &value, now).await {
                warn!(key, error = %e, "Failed to update config after sync");
                summary.warn(format!("config {} not updated: {}", key, e));
            }
        }
    }
}
