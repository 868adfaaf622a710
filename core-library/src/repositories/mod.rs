//! # Repositories
//!
//! Trait-based access to the club data store. Each trait has a SQLite
//! implementation backed by a shared `SqlitePool`.
//!
//! ## Available Repositories
//!
//! - `ClubRepository` - The tracked club, its venues and staff
//! - `TeamRepository` - Teams and their engagements
//! - `CompetitionRepository` - Competitions referenced by engagements and matches
//! - `MatchRepository` - Calendar, results and the opponent club cache
//! - `StandingRepository` - League standings per matchday
//! - `ConfigRepository` - Key/value settings and last-sync timestamps
//! - `SyncLogRepository` - Append-only run log
//! - `SyncLockRepository` - Lease row that serializes sync runs

pub mod club;
pub mod competition;
pub mod config;
pub mod lock;
pub mod matches;
pub mod standing;
pub mod sync_log;
pub mod team;

pub use club::{ClubRepository, SqliteClubRepository};
pub use competition::{CompetitionRepository, SqliteCompetitionRepository};
pub use config::{format_timestamp, keys, ConfigRepository, SqliteConfigRepository};
pub use lock::{SqliteSyncLockRepository, SyncLockRepository};
pub use matches::{MatchRepository, SqliteMatchRepository};
pub use standing::{SqliteStandingRepository, StandingRepository};
pub use sync_log::{SqliteSyncLogRepository, SyncLogRepository};
pub use team::{SqliteTeamRepository, TeamRepository};

#[cfg(test)]
pub(crate) mod fixtures;
