//! Match partitioning and upsert

use std::collections::HashMap;

use bridge_traits::federation::MatchRecord;
use core_runtime::BatchLimits;
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use super::{within_limit, Entity, ReconcileOutcome};
use crate::datetime::{normalize_date, optional_date, optional_timestamp};
use crate::resolver::{get_or_create_competition, resolve_venue};
use crate::Result;

const FLAG_NO: &str = "N";

/// Matches split into upcoming fixtures and completed results
#[derive(Debug, Clone, Default)]
pub struct MatchPartition {
    pub calendar: Vec<MatchRecord>,
    pub results: Vec<MatchRecord>,
}

impl MatchPartition {
    /// Every retained match, calendar first
    pub fn all(&self) -> impl Iterator<Item = &MatchRecord> {
        self.calendar.iter().chain(self.results.iter())
    }
}

/// Ordering key for "most recent" among cup results: date, then kickoff time
fn recency_key(record: &MatchRecord) -> (Option<String>, Option<String>) {
    (
        record.date.as_deref().and_then(normalize_date),
        record.time.clone(),
    )
}

/// Split matches on whether a home score is present
///
/// Leagues keep every result. Cups keep only the most recent result per
/// competition; among equal dates and times the later record wins.
pub fn partition_matches(records: Vec<MatchRecord>) -> MatchPartition {
    let mut partition = MatchPartition::default();
    let mut latest_cup_result: HashMap<i64, usize> = HashMap::new();

    for record in records {
        if !record.is_result() {
            partition.calendar.push(record);
            continue;
        }

        let cup_number = record
            .competition
            .as_ref()
            .filter(|c| c.is_cup())
            .and_then(|c| c.cp_no);

        match cup_number {
            Some(cp_no) => match latest_cup_result.get(&cp_no) {
                Some(&index) => {
                    if recency_key(&record) >= recency_key(&partition.results[index]) {
                        partition.results[index] = record;
                    }
                }
                None => {
                    latest_cup_result.insert(cp_no, partition.results.len());
                    partition.results.push(record);
                }
            },
            None => partition.results.push(record),
        }
    }

    debug!(
        calendar = partition.calendar.len(),
        results = partition.results.len(),
        "Partitioned matches"
    );
    partition
}

/// Upsert matches keyed by `ma_no`
///
/// Competition and venue are resolved before the row is written. Records
/// missing `ma_no`, a competition number or a status are skipped, as are
/// records whose date does not parse.
pub async fn reconcile_matches(
    tx: &mut Transaction<'_, Sqlite>,
    records: &[MatchRecord],
    is_result: bool,
    limits: &BatchLimits,
    season: i64,
) -> Result<ReconcileOutcome> {
    let mut outcome = ReconcileOutcome::default();

    for record in within_limit(records, Entity::Match, limits, &mut outcome) {
        let Some(ma_no) = record.ma_no else {
            outcome.skip(Entity::Match, "missing ma_no");
            continue;
        };
        let Some(competition) = record.competition.as_ref().filter(|c| c.cp_no.is_some()) else {
            outcome.skip(Entity::Match, format!("{} has no competition number", ma_no));
            continue;
        };
        let Some(date) = record.date.as_deref().and_then(normalize_date) else {
            outcome.skip(
                Entity::Match,
                format!(
                    "{} has an unparsable date {:?}",
                    ma_no,
                    record.date.as_deref().unwrap_or("")
                ),
            );
            continue;
        };
        let Some(status) = record.status.as_deref().filter(|s| !s.is_empty()) else {
            outcome.skip(Entity::Match, format!("{} has no status", ma_no));
            continue;
        };

        let competition_id = get_or_create_competition(tx, competition, season).await?;
        let terrain_id = resolve_venue(tx, record.terrain.as_ref()).await?;

        let phase = record.phase.as_ref();
        let poule = record.poule.as_ref();
        let home = record.home.as_ref();
        let away = record.away.as_ref();

        sqlx::query(
            r#"
            INSERT INTO matches (
                ma_no, competition_id, terrain_id, season, date, time, initial_date,
                phase_number, phase_type, phase_name, pool_stage_number, pool_name,
                matchday_number,
                home_club_number, home_team_category, home_team_number, home_team_name,
                home_score, home_is_forfeit,
                away_club_number, away_team_category, away_team_number, away_team_name,
                away_score, away_is_forfeit,
                status, status_label, is_overtime, seems_postponed, is_result,
                external_updated_at
            )
            VALUES (
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
            )
            ON CONFLICT(ma_no) DO UPDATE SET
                competition_id = excluded.competition_id,
                terrain_id = excluded.terrain_id,
                season = excluded.season,
                date = excluded.date,
                time = excluded.time,
                initial_date = excluded.initial_date,
                phase_number = excluded.phase_number,
                phase_type = excluded.phase_type,
                phase_name = excluded.phase_name,
                pool_stage_number = excluded.pool_stage_number,
                pool_name = excluded.pool_name,
                matchday_number = excluded.matchday_number,
                home_club_number = excluded.home_club_number,
                home_team_category = excluded.home_team_category,
                home_team_number = excluded.home_team_number,
                home_team_name = excluded.home_team_name,
                home_score = excluded.home_score,
                home_is_forfeit = excluded.home_is_forfeit,
                away_club_number = excluded.away_club_number,
                away_team_category = excluded.away_team_category,
                away_team_number = excluded.away_team_number,
                away_team_name = excluded.away_team_name,
                away_score = excluded.away_score,
                away_is_forfeit = excluded.away_is_forfeit,
                status = excluded.status,
                status_label = excluded.status_label,
                is_overtime = excluded.is_overtime,
                seems_postponed = excluded.seems_postponed,
                is_result = excluded.is_result,
                external_updated_at = excluded.external_updated_at
            "#,
        )
        .bind(ma_no)
        .bind(competition_id)
        .bind(terrain_id)
        .bind(record.season.unwrap_or(season))
        .bind(&date)
        .bind(&record.time)
        .bind(optional_date(record.initial_date.as_deref()))
        .bind(phase.and_then(|p| p.number))
        .bind(phase.and_then(|p| p.phase_type.clone()))
        .bind(phase.and_then(|p| p.name.clone()))
        .bind(poule.and_then(|p| p.stage_number))
        .bind(poule.and_then(|p| p.name.clone()))
        .bind(record.poule_journee.as_ref().and_then(|j| j.number))
        .bind(home.and_then(|s| s.club_number()))
        .bind(home.and_then(|s| s.category_code.clone()))
        .bind(home.and_then(|s| s.number))
        .bind(home.and_then(|s| s.short_name.clone()))
        .bind(record.home_score)
        .bind(record.home_is_forfeit.as_deref().unwrap_or(FLAG_NO))
        .bind(away.and_then(|s| s.club_number()))
        .bind(away.and_then(|s| s.category_code.clone()))
        .bind(away.and_then(|s| s.number))
        .bind(away.and_then(|s| s.short_name.clone()))
        .bind(record.away_score)
        .bind(record.away_is_forfeit.as_deref().unwrap_or(FLAG_NO))
        .bind(status)
        .bind(&record.status_label)
        .bind(record.is_overtime.as_deref().unwrap_or(FLAG_NO))
        .bind(&record.seems_postponed)
        .bind(is_result)
        .bind(optional_timestamp(record.external_updated_at.as_deref()))
        .execute(&mut **tx)
        .await?;

        outcome.processed += 1;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{competition, count, fixture, result, seed_club};
    use bridge_traits::federation::VenueReference;
    use core_library::db::create_test_pool;
    use core_library::models::Match;

    #[test]
    fn test_partition_keeps_latest_cup_result() {
        let cup = competition(300, "CP");
        let league = competition(778899, "CH");
        let records = vec![
            fixture(1, league.clone(), "2025-10-05T15:00:00+02:00"),
            result(2, league.clone(), "2025-09-14T15:00:00+02:00", (2, 1)),
            result(3, league, "2025-09-21T15:00:00+02:00", (0, 0)),
            result(4, cup.clone(), "2025-09-07T15:00:00+02:00", (3, 0)),
            result(5, cup.clone(), "2025-09-28T15:00:00+02:00", (1, 0)),
            result(6, cup, "2025-09-20T15:00:00+02:00", (4, 2)),
        ];

        let partition = partition_matches(records);

        assert_eq!(partition.calendar.len(), 1);
        let kept: Vec<i64> = partition.results.iter().filter_map(|m| m.ma_no).collect();
        assert_eq!(kept, vec![2, 3, 5]);
        assert_eq!(partition.all().count(), 4);
    }

    #[test]
    fn test_partition_cup_tie_prefers_later_record() {
        let cup = competition(300, "CP");
        let records = vec![
            result(7, cup.clone(), "2025-09-07", (1, 0)),
            result(8, cup, "2025-09-07T00:00:00+02:00", (2, 0)),
        ];

        let partition = partition_matches(records);

        assert_eq!(partition.results.len(), 1);
        assert_eq!(partition.results[0].ma_no, Some(8));
    }

    #[tokio::test]
    async fn test_reconcile_writes_normalized_match() {
        let pool = create_test_pool().await.unwrap();
        let club_id = seed_club(&pool).await;
        let venue_id: i64 = sqlx::query_scalar(
            "INSERT INTO terrains (te_no, club_id, name) VALUES (42, ?, 'Stade') RETURNING id",
        )
        .bind(club_id)
        .fetch_one(&pool)
        .await
        .unwrap();

        let mut record = result(9911, competition(778899, "CH"), "2025-09-14T15:00:00+02:00", (2, 1));
        record.terrain = Some(VenueReference::Number(42));
        record.external_updated_at = Some("2025-09-14T19:30:00+02:00".to_string());

        let mut tx = pool.begin().await.unwrap();
        let outcome = reconcile_matches(&mut tx, &[record], true, &BatchLimits::default(), 2025)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(outcome.processed, 1);
        let stored: Match = sqlx::query_as("SELECT * FROM matches").fetch_one(&pool).await.unwrap();
        assert_eq!(stored.date, "2025-09-14");
        assert_eq!(stored.terrain_id, Some(venue_id));
        assert_eq!(stored.home_score, Some(2));
        assert_eq!(stored.home_club_number, Some(5403));
        assert_eq!(stored.away_club_number, Some(9001));
        assert_eq!(stored.home_is_forfeit, "N");
        assert_eq!(stored.is_overtime, "N");
        assert!(stored.is_result);
        assert_eq!(stored.external_updated_at.as_deref(), Some("2025-09-14 17:30:00"));
    }

    #[tokio::test]
    async fn test_fixture_becomes_result_in_place() {
        let pool = create_test_pool().await.unwrap();
        let league = competition(778899, "CH");
        let limits = BatchLimits::default();

        let mut tx = pool.begin().await.unwrap();
        reconcile_matches(&mut tx, &[fixture(10, league.clone(), "2025-09-14")], false, &limits, 2025)
            .await
            .unwrap();
        reconcile_matches(&mut tx, &[result(10, league, "2025-09-14", (1, 1))], true, &limits, 2025)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(count(&pool, "matches").await, 1);
        let is_result: bool = sqlx::query_scalar("SELECT is_result FROM matches WHERE ma_no = 10")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(is_result);
    }

    #[tokio::test]
    async fn test_invalid_matches_skipped() {
        let pool = create_test_pool().await.unwrap();
        let league = competition(778899, "CH");
        let mut no_status = fixture(3, league.clone(), "2025-09-14");
        no_status.status = None;
        let records = vec![
            MatchRecord {
                ma_no: None,
                ..fixture(1, league.clone(), "2025-09-14")
            },
            fixture(2, league.clone(), "le 14 septembre"),
            no_status,
            MatchRecord {
                competition: None,
                ..fixture(4, league.clone(), "2025-09-14")
            },
            fixture(5, league, "2025-09-14"),
        ];

        let mut tx = pool.begin().await.unwrap();
        let outcome = reconcile_matches(&mut tx, &records, false, &BatchLimits::default(), 2025)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.skipped, 4);
        assert!(outcome.warnings.iter().any(|w| w.contains("unparsable date")));
        assert_eq!(count(&pool, "matches").await, 1);
    }
}
