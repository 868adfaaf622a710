//! Leased run lock
//!
//! A sync run takes a lease row before fetching anything. The lease expires
//! after a TTL so a crashed run cannot block later ones forever; a live run
//! renews it between fetch steps.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::time::Clock;
use core_library::repositories::SyncLockRepository;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{Result, SyncError};

/// Lock row shared by every full sync
pub const FULL_SYNC_LOCK: &str = "full_sync";

/// Proof that the current run holds the lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLease {
    pub name: String,
    pub owner: String,
}

pub struct RunLock {
    repository: Arc<dyn SyncLockRepository>,
    clock: Arc<dyn Clock>,
    name: String,
    ttl: Duration,
}

impl RunLock {
    pub fn new(repository: Arc<dyn SyncLockRepository>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            repository,
            clock,
            name: FULL_SYNC_LOCK.to_string(),
            ttl,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Take the lease under a fresh owner token
    ///
    /// # Errors
    ///
    /// `SyncError::SyncInProgress` when another owner holds an unexpired
    /// lease.
    pub async fn acquire(&self) -> Result<RunLease> {
        let owner = Uuid::new_v4().to_string();
        let ttl_secs = self.ttl.as_secs().max(1) as i64;

        let acquired = self
            .repository
            .try_acquire(&self.name, &owner, self.clock.unix_timestamp(), ttl_secs)
            .await?;

        if !acquired {
            let holder = self
                .repository
                .holder(&self.name)
                .await?
                .unwrap_or_else(|| "unknown".to_string());
            return Err(SyncError::SyncInProgress { holder });
        }

        debug!(lock = %self.name, owner = %owner, ttl_secs, "Run lock acquired");
        Ok(RunLease {
            name: self.name.clone(),
            owner,
        })
    }

    /// Extend the lease by a full TTL from now
    ///
    /// # Errors
    ///
    /// `SyncError::LeaseLost` when the lease already expired, whether or not
    /// another run took it over.
    pub async fn renew(&self, lease: &RunLease) -> Result<()> {
        let ttl_secs = self.ttl.as_secs().max(1) as i64;
        let renewed = self
            .repository
            .renew(&lease.name, &lease.owner, self.clock.unix_timestamp(), ttl_secs)
            .await?;

        if !renewed {
            warn!(lock = %lease.name, owner = %lease.owner, "Run lock lost");
            return Err(SyncError::LeaseLost {
                lock: lease.name.clone(),
            });
        }

        debug!(lock = %lease.name, ttl_secs, "Run lock renewed");
        Ok(())
    }

    /// Give the lease back; failures are logged, the lease then expires on its own
    pub async fn release(&self, lease: RunLease) {
        match self.repository.release(&lease.name, &lease.owner).await {
            Ok(true) => debug!(lock = %lease.name, "Run lock released"),
            Ok(false) => warn!(lock = %lease.name, owner = %lease.owner, "Run lock was no longer held"),
            Err(e) => warn!(lock = %lease.name, error = %e, "Failed to release run lock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::time::FixedClock;
    use chrono::{TimeZone, Utc};
    use core_library::db::create_test_pool;
    use core_library::repositories::SqliteSyncLockRepository;

    async fn setup() -> (RunLock, Arc<FixedClock>) {
        let pool = create_test_pool().await.unwrap();
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 9, 14, 6, 0, 0).unwrap()));
        let lock = RunLock::new(
            Arc::new(SqliteSyncLockRepository::new(pool)),
            clock.clone(),
            Duration::from_secs(300),
        );
        (lock, clock)
    }

    #[tokio::test]
    async fn test_second_acquire_is_refused() {
        let (lock, _) = setup().await;

        let lease = lock.acquire().await.unwrap();
        let second = lock.acquire().await;

        match second {
            Err(SyncError::SyncInProgress { holder }) => assert_eq!(holder, lease.owner),
            other => panic!("expected SyncInProgress, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_release_frees_lock() {
        let (lock, _) = setup().await;

        let lease = lock.acquire().await.unwrap();
        lock.release(lease).await;

        assert!(lock.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_renewed_lease_outlives_first_ttl() {
        let (lock, clock) = setup().await;

        let lease = lock.acquire().await.unwrap();
        clock.advance(chrono::Duration::seconds(250));
        lock.renew(&lease).await.unwrap();
        clock.advance(chrono::Duration::seconds(250));

        assert!(matches!(lock.acquire().await, Err(SyncError::SyncInProgress { .. })));
        lock.renew(&lease).await.unwrap();
    }

    #[tokio::test]
    async fn test_renew_after_takeover_reports_lost_lease() {
        let (lock, clock) = setup().await;

        let stale = lock.acquire().await.unwrap();
        clock.advance(chrono::Duration::seconds(301));
        let _fresh = lock.acquire().await.unwrap();

        assert!(matches!(
            lock.renew(&stale).await,
            Err(SyncError::LeaseLost { lock }) if lock == FULL_SYNC_LOCK
        ));
    }

    #[tokio::test]
    async fn test_renew_after_expiry_reports_lost_lease() {
        let (lock, clock) = setup().await;

        let lease = lock.acquire().await.unwrap();
        clock.advance(chrono::Duration::seconds(300));

        assert!(matches!(lock.renew(&lease).await, Err(SyncError::LeaseLost { .. })));
    }

    #[tokio::test]
    async fn test_expired_lease_is_taken_over() {
        let (lock, clock) = setup().await;

        let stale = lock.acquire().await.unwrap();
        clock.advance(chrono::Duration::seconds(301));
        let fresh = lock.acquire().await.unwrap();

        assert_ne!(stale.owner, fresh.owner);
        // The stale owner can no longer release the new lease.
        lock.release(stale).await;
        assert!(matches!(lock.acquire().await, Err(SyncError::SyncInProgress { .. })));
    }
}
