//! Run summary and sync categories

use core_library::models::RunStatus;
use core_library::repositories::keys;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data category whose last successful sync is stamped in the config table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncCategory {
    Club,
    Teams,
    Calendar,
    Results,
    Standings,
}

impl SyncCategory {
    pub const ALL: [SyncCategory; 5] = [
        SyncCategory::Club,
        SyncCategory::Teams,
        SyncCategory::Calendar,
        SyncCategory::Results,
        SyncCategory::Standings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncCategory::Club => "club",
            SyncCategory::Teams => "teams",
            SyncCategory::Calendar => "calendar",
            SyncCategory::Results => "results",
            SyncCategory::Standings => "standings",
        }
    }

    /// Config key holding the last successful sync time of this category
    pub fn config_key(&self) -> &'static str {
        match self {
            SyncCategory::Club => keys::LAST_SYNC_CLUB,
            SyncCategory::Teams => keys::LAST_SYNC_TEAMS,
            SyncCategory::Calendar => keys::LAST_SYNC_CALENDAR,
            SyncCategory::Results => keys::LAST_SYNC_RESULTS,
            SyncCategory::Standings => keys::LAST_SYNC_STANDINGS,
        }
    }
}

impl fmt::Display for SyncCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one orchestrator run
///
/// Serialized as the message of the run's log row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub success: bool,
    pub club_synced: bool,
    pub teams: usize,
    pub calendar: usize,
    pub results: usize,
    pub opponents: usize,
    pub standings: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SyncSummary {
    /// Sum of the per-entity counters
    pub fn records_processed(&self) -> i64 {
        (self.teams + self.calendar + self.results + self.opponents + self.standings) as i64
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }

    /// Status recorded in the run log
    pub fn status(&self) -> RunStatus {
        if !self.success {
            RunStatus::Error
        } else if !self.warnings.is_empty() {
            RunStatus::Warning
        } else {
            RunStatus::Success
        }
    }

    /// Summary for a run that failed before or during reconciliation
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![error.into()],
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_processed() {
        let summary = SyncSummary {
            success: true,
            club_synced: true,
            teams: 4,
            calendar: 10,
            results: 6,
            opponents: 8,
            standings: 12,
            ..SyncSummary::default()
        };
        assert_eq!(summary.records_processed(), 40);
    }

    #[test]
    fn test_status() {
        let mut summary = SyncSummary {
            success: true,
            ..SyncSummary::default()
        };
        assert_eq!(summary.status(), RunStatus::Success);

        summary.warn("match 12 skipped: unparsable date");
        assert_eq!(summary.status(), RunStatus::Warning);

        assert_eq!(SyncSummary::failed("boom").status(), RunStatus::Error);
    }

    #[test]
    fn test_category_keys() {
        assert_eq!(SyncCategory::Calendar.config_key(), "last_sync_calendar");
        assert_eq!(SyncCategory::Teams.to_string(), "teams");
        assert_eq!(SyncCategory::ALL.len(), 5);
    }
}
