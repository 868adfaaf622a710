//! # Club Synchronization Engine
//!
//! Pulls the tracked club's data from the federation source and reconciles
//! it into the relational store.
//!
//! ## Components
//!
//! - **Reference Resolver** (`resolver`): competition get-or-create and venue
//!   reference parsing
//! - **Entity Reconcilers** (`reconcile`): per-entity upserts keyed by
//!   federation numbers
//! - **Date Normalization** (`datetime`): dates and UTC timestamps as stored
//! - **Run Lock** (`run_lock`): leased row that keeps runs from overlapping
//! - **Run Logger** (`run_log`): one `sync_logs` row per run
//! - **Sync Orchestrator** (`orchestrator`): the transactional envelope

pub mod datetime;
pub mod error;
pub mod orchestrator;
pub mod reconcile;
pub mod resolver;
pub mod run_lock;
pub mod run_log;
pub mod summary;

#[cfg(test)]
mod test_support;

pub use error::{Result, SyncError};
pub use orchestrator::{SyncOrchestrator, SyncSettings};
pub use reconcile::{Entity, ReconcileOutcome, ReconcileStrategy};
pub use run_lock::{RunLease, RunLock, FULL_SYNC_LOCK};
pub use run_log::{RunLogger, FULL_SYNC_ENDPOINT};
pub use summary::{SyncCategory, SyncSummary};
