//! # Entity Reconcilers
//!
//! Each reconciler writes one kind of federation record into the store
//! inside the caller's transaction. Per-record data problems (missing keys,
//! unparsable dates) skip the record and add a warning; database and
//! reference failures are returned as errors and abort the run.
//!
//! Every reconciler caps the number of records it handles per call. Overflow
//! is logged and reported as a warning.

use core_runtime::BatchLimits;
use tracing::warn;

pub mod club;
pub mod engagements;
pub mod matches;
pub mod members;
pub mod opponents;
pub mod standings;
pub mod teams;
pub mod venues;

pub use club::reconcile_club;
pub use engagements::reconcile_engagements;
pub use matches::{partition_matches, reconcile_matches, MatchPartition};
pub use members::reconcile_members;
pub use opponents::{collect_opponents, reconcile_opponents, OpponentEntry};
pub use standings::reconcile_standings;
pub use teams::{reconcile_teams, RosterOutcome};
pub use venues::reconcile_venues;

/// How stored rows relate to an incoming batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStrategy {
    /// Insert or update each record by its natural key; rows absent from the
    /// batch are left alone
    UpsertByKey,
    /// Delete the owner's rows, then insert the batch
    ReplaceAll,
}

/// Kinds of records written during a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Venue,
    Member,
    Team,
    Engagement,
    Match,
    Opponent,
    Standing,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Venue => "venue",
            Entity::Member => "member",
            Entity::Team => "team",
            Entity::Engagement => "engagement",
            Entity::Match => "match",
            Entity::Opponent => "opponent",
            Entity::Standing => "standing",
        }
    }

    pub fn strategy(&self) -> ReconcileStrategy {
        match self {
            Entity::Member => ReconcileStrategy::ReplaceAll,
            _ => ReconcileStrategy::UpsertByKey,
        }
    }

    pub fn limit(&self, limits: &BatchLimits) -> usize {
        match self {
            Entity::Venue => limits.venues,
            Entity::Member => limits.members,
            Entity::Team => limits.teams,
            Entity::Engagement => limits.engagements,
            Entity::Match => limits.matches,
            Entity::Opponent => limits.opponents,
            Entity::Standing => limits.standings,
        }
    }
}

/// Counters and warnings produced by one reconciler call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Records written
    pub processed: usize,
    /// Records skipped for data problems
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl ReconcileOutcome {
    pub fn skip(&mut self, entity: Entity, reason: impl AsRef<str>) {
        let message = format!("{} skipped: {}", entity.as_str(), reason.as_ref());
        warn!(entity = entity.as_str(), "{}", message);
        self.skipped += 1;
        self.warnings.push(message);
    }

    pub fn merge(&mut self, other: ReconcileOutcome) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.warnings.extend(other.warnings);
    }
}

/// Cap a batch at the entity's limit, recording the overflow
pub fn within_limit<'a, T>(
    records: &'a [T],
    entity: Entity,
    limits: &BatchLimits,
    outcome: &mut ReconcileOutcome,
) -> &'a [T] {
    let limit = entity.limit(limits);
    if records.len() <= limit {
        return records;
    }

    let overflow = records.len() - limit;
    warn!(
        entity = entity.as_str(),
        total = records.len(),
        limit,
        overflow,
        "Batch limit exceeded; extra records not processed"
    );
    outcome.warnings.push(format!(
        "{} batch limit {} exceeded: {} of {} records not processed",
        entity.as_str(),
        limit,
        overflow,
        records.len()
    ));
    &records[..limit]
}
