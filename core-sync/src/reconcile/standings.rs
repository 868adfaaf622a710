//! League standings upsert

use bridge_traits::federation::StandingRecord;
use core_runtime::BatchLimits;
use sqlx::{Sqlite, Transaction};

use super::{within_limit, Entity, ReconcileOutcome};
use crate::datetime::{normalize_date, optional_timestamp};
use crate::resolver::get_or_create_competition;
use crate::Result;

/// Upsert standings rows keyed by (competition, matchday, ranking type, club, team)
///
/// Only league competitions carry standings; rows for other competitions are
/// skipped along with rows missing a required field or a parsable date.
pub async fn reconcile_standings(
    tx: &mut Transaction<'_, Sqlite>,
    records: &[StandingRecord],
    limits: &BatchLimits,
    season: i64,
) -> Result<ReconcileOutcome> {
    let mut outcome = ReconcileOutcome::default();

    for record in within_limit(records, Entity::Standing, limits, &mut outcome) {
        let Some(competition) = record.competition.as_ref().filter(|c| c.cp_no.is_some()) else {
            outcome.skip(Entity::Standing, "missing competition number");
            continue;
        };
        if !competition.is_league() {
            outcome.skip(
                Entity::Standing,
                format!("competition {:?} is not a league", competition.cp_no),
            );
            continue;
        }
        let (Some(cj_no), Some(cl_no)) = (record.cj_no, record.club_number()) else {
            outcome.skip(Entity::Standing, "missing cj_no or club number");
            continue;
        };
        let Some(ranking_type) = record.ranking_type.as_deref().filter(|t| !t.is_empty()) else {
            outcome.skip(Entity::Standing, format!("matchday {} club {} has no ranking type", cj_no, cl_no));
            continue;
        };
        let (Some(rank), Some(points), Some(played)) =
            (record.rank, record.point_count, record.total_games_count)
        else {
            outcome.skip(
                Entity::Standing,
                format!("matchday {} club {} is missing rank, points or games played", cj_no, cl_no),
            );
            continue;
        };
        let Some(date) = record.date.as_deref().and_then(normalize_date) else {
            outcome.skip(
                Entity::Standing,
                format!("matchday {} club {} has an unparsable date", cj_no, cl_no),
            );
            continue;
        };

        let competition_id = get_or_create_competition(tx, competition, season).await?;
        let team = record.team.as_ref();
        let poule = record.poule.as_ref();

        sqlx::query(
            r#"
            INSERT INTO standings (
                competition_id, season, date, cj_no, ranking_type, cl_no,
                team_category, team_number, team_short_name,
                ranking, point_count, penalty_point_count, total_games_count,
                won_games_count, draw_games_count, lost_games_count, forfeits_games_count,
                goals_for_count, goals_against_count, goals_diff,
                phase_number, pool_stage_number, pool_name, is_forfeit, external_updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?, ?)
            ON CONFLICT(competition_id, cj_no, ranking_type, cl_no, team_number) DO UPDATE SET
                season = excluded.season,
                date = excluded.date,
                team_category = excluded.team_category,
                team_short_name = excluded.team_short_name,
                ranking = excluded.ranking,
                point_count = excluded.point_count,
                penalty_point_count = excluded.penalty_point_count,
                total_games_count = excluded.total_games_count,
                won_games_count = excluded.won_games_count,
                draw_games_count = excluded.draw_games_count,
                lost_games_count = excluded.lost_games_count,
                forfeits_games_count = excluded.forfeits_games_count,
                goals_for_count = excluded.goals_for_count,
                goals_against_count = excluded.goals_against_count,
                goals_diff = excluded.goals_diff,
                pool_stage_number = excluded.pool_stage_number,
                pool_name = excluded.pool_name,
                is_forfeit = excluded.is_forfeit,
                external_updated_at = excluded.external_updated_at
            "#,
        )
        .bind(competition_id)
        .bind(record.season.unwrap_or(season))
        .bind(&date)
        .bind(cj_no)
        .bind(ranking_type)
        .bind(cl_no)
        .bind(team.and_then(|t| t.category_code.clone()))
        .bind(team.and_then(|t| t.number).unwrap_or(0))
        .bind(team.and_then(|t| t.short_name.clone()))
        .bind(rank)
        .bind(points)
        .bind(record.penalty_point_count.unwrap_or(0))
        .bind(played)
        .bind(record.won_games_count.unwrap_or(0))
        .bind(record.draw_games_count.unwrap_or(0))
        .bind(record.lost_games_count.unwrap_or(0))
        .bind(record.forfeits_games_count.unwrap_or(0))
        .bind(record.goals_for_count.unwrap_or(0))
        .bind(record.goals_against_count.unwrap_or(0))
        .bind(record.goals_diff.unwrap_or(0))
        .bind(poule.and_then(|p| p.stage_number))
        .bind(poule.and_then(|p| p.name.clone()))
        .bind(record.is_forfait)
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
    use crate::test_support::{competition, count, standing, TRACKED_CLUB};
    use core_library::db::create_test_pool;
    use core_library::models::Standing;

    #[tokio::test]
    async fn test_table_upsert() {
        let pool = create_test_pool().await.unwrap();
        let league = competition(778899, "CH");
        let first = vec![
            standing(league.clone(), 3, TRACKED_CLUB, 1),
            standing(league.clone(), 3, 9001, 2),
        ];
        let mut moved = first.clone();
        moved[0].rank = Some(2);
        moved[1].rank = Some(1);

        let mut tx = pool.begin().await.unwrap();
        reconcile_standings(&mut tx, &first, &BatchLimits::default(), 2025).await.unwrap();
        let outcome = reconcile_standings(&mut tx, &moved, &BatchLimits::default(), 2025)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(outcome.processed, 2);
        assert_eq!(count(&pool, "standings").await, 2);
        let ours: Standing = sqlx::query_as("SELECT * FROM standings WHERE cl_no = ?")
            .bind(TRACKED_CLUB)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(ours.ranking, 2);
        assert_eq!(ours.date, "2025-09-14");
        assert_eq!(ours.pool_name.as_deref(), Some("Poule A"));
        assert_eq!(ours.phase_number, None);
    }

    #[tokio::test]
    async fn test_invalid_rows_skipped() {
        let pool = create_test_pool().await.unwrap();
        let league = competition(778899, "CH");
        let mut bad_date = standing(league.clone(), 3, 9002, 3);
        bad_date.date = Some("demain".to_string());
        let records = vec![
            StandingRecord {
                cj_no: None,
                ..standing(league.clone(), 3, 9001, 2)
            },
            StandingRecord {
                team: None,
                ..standing(league.clone(), 3, 9003, 4)
            },
            bad_date,
            standing(competition(300, "CP"), 1, 9004, 1),
            standing(league, 3, TRACKED_CLUB, 1),
        ];

        let mut tx = pool.begin().await.unwrap();
        let outcome = reconcile_standings(&mut tx, &records, &BatchLimits::default(), 2025)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.skipped, 4);
        assert_eq!(count(&pool, "standings").await, 1);
        assert_eq!(count(&pool, "competitions").await, 1);
    }
}
