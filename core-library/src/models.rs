//! Row models for the club data store
//!
//! One struct per table, mapped with `sqlx::FromRow`. Internal ids are SQLite
//! row ids; `*_no` fields are the federation's external keys.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::error::LibraryError;

// =============================================================================
// Synchronized entities
// =============================================================================

/// The tracked club
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Club {
    pub id: i64,
    pub cl_no: i64,
    pub affiliation_number: Option<String>,
    pub name: String,
    pub short_name: Option<String>,
    pub location: Option<String>,
    pub colors: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub address3: Option<String>,
    pub postal_code: Option<String>,
    pub distributor_office: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub logo_url: Option<String>,
    pub district_name: Option<String>,
    pub district_cg_no: Option<i64>,
}

/// Venue (terrain) owned by a club
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Venue {
    pub id: i64,
    pub te_no: i64,
    pub club_id: i64,
    pub name: String,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub surface_type: Option<String>,
}

/// Club staff member; the whole set is replaced on every sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: i64,
    pub club_id: i64,
    pub last_name: String,
    pub first_name: String,
    pub role: String,
}

/// Team (equipe)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: i64,
    pub club_id: i64,
    pub category_code: String,
    pub number: i64,
    pub code: Option<String>,
    pub short_name: Option<String>,
    pub competition_type: Option<String>,
    pub season: i64,
    pub category_label: Option<String>,
    pub category_gender: Option<String>,
    pub diffusable: bool,
}

/// Competition, created on first reference and never updated afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Competition {
    pub id: i64,
    pub cp_no: i64,
    pub season: i64,
    pub competition_type: Option<String>,
    pub name: String,
    pub level: Option<String>,
    pub cdg_cg_no: Option<i64>,
    pub cdg_name: Option<String>,
    pub external_updated_at: Option<String>,
}

/// A team's participation in a competition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Engagement {
    pub id: i64,
    pub team_id: i64,
    pub competition_id: i64,
    pub terrain_id: Option<i64>,
    pub status: Option<String>,
    pub general_forfeit: String,
    pub round_number: Option<i64>,
    pub eliminated: String,
    pub phase_number: Option<i64>,
    pub pool_stage_number: Option<i64>,
}

/// Match (calendar entry or result)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Match {
    pub id: i64,
    pub ma_no: i64,
    pub competition_id: i64,
    pub terrain_id: Option<i64>,
    pub season: i64,
    pub date: String,
    pub time: Option<String>,
    pub initial_date: Option<String>,
    pub phase_number: Option<i64>,
    pub phase_type: Option<String>,
    pub phase_name: Option<String>,
    pub pool_stage_number: Option<i64>,
    pub pool_name: Option<String>,
    pub matchday_number: Option<i64>,
    pub home_club_number: Option<i64>,
    pub home_team_category: Option<String>,
    pub home_team_number: Option<i64>,
    pub home_team_name: Option<String>,
    pub home_score: Option<i64>,
    pub home_is_forfeit: String,
    pub away_club_number: Option<i64>,
    pub away_team_category: Option<String>,
    pub away_team_number: Option<i64>,
    pub away_team_name: Option<String>,
    pub away_score: Option<i64>,
    pub away_is_forfeit: String,
    pub status: String,
    pub status_label: Option<String>,
    pub is_overtime: String,
    pub seems_postponed: Option<String>,
    pub is_result: bool,
    pub external_updated_at: Option<String>,
}

/// Display data of an opposing club
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OpponentClub {
    pub id: i64,
    pub cl_no: i64,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub logo_url: Option<String>,
}

/// Standings row for one team on one matchday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Standing {
    pub id: i64,
    pub competition_id: i64,
    pub season: i64,
    pub date: String,
    pub cj_no: i64,
    pub ranking_type: String,
    pub cl_no: i64,
    pub team_category: Option<String>,
    pub team_number: i64,
    pub team_short_name: Option<String>,
    pub ranking: i64,
    pub point_count: i64,
    pub penalty_point_count: i64,
    pub total_games_count: i64,
    pub won_games_count: i64,
    pub draw_games_count: i64,
    pub lost_games_count: i64,
    pub forfeits_games_count: i64,
    pub goals_for_count: i64,
    pub goals_against_count: i64,
    pub goals_diff: i64,
    pub phase_number: Option<i64>,
    pub pool_stage_number: Option<i64>,
    pub pool_name: Option<String>,
    pub is_forfeit: bool,
    pub external_updated_at: Option<String>,
}

// =============================================================================
// Run metadata
// =============================================================================

/// Key/value configuration entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ConfigEntry {
    pub config_key: String,
    pub config_value: String,
    pub updated_at: String,
}

/// Outcome recorded for a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
    Warning,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Error => "error",
            RunStatus::Warning => "warning",
        }
    }
}

impl FromStr for RunStatus {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(RunStatus::Success),
            "error" => Ok(RunStatus::Error),
            "warning" => Ok(RunStatus::Warning),
            _ => Err(LibraryError::InvalidInput {
                field: "status".to_string(),
                message: format!("unknown run status '{}'", s),
            }),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored sync log row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SyncLogEntry {
    pub id: i64,
    pub endpoint: String,
    pub status: String,
    pub message: Option<String>,
    pub records_processed: i64,
    pub execution_time_ms: i64,
    pub created_at: String,
}

impl SyncLogEntry {
    pub fn run_status(&self) -> Option<RunStatus> {
        self.status.parse().ok()
    }
}

/// Sync log row to append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSyncLog {
    pub endpoint: String,
    pub status: RunStatus,
    pub message: Option<String>,
    pub records_processed: i64,
    pub execution_time_ms: i64,
}
