//! Engagement upsert, one row per (team, competition)

use bridge_traits::federation::EngagementRecord;
use core_runtime::BatchLimits;
use sqlx::{Sqlite, Transaction};

use super::{within_limit, Entity, ReconcileOutcome};
use crate::resolver::{get_or_create_competition, resolve_venue};
use crate::Result;

const FLAG_NO: &str = "N";

/// Upsert a team's engagements
///
/// The competition is created on first reference. Engagements without a
/// competition number are skipped here rather than failing the resolver.
pub async fn reconcile_engagements(
    tx: &mut Transaction<'_, Sqlite>,
    team_id: i64,
    records: &[EngagementRecord],
    limits: &BatchLimits,
    season: i64,
) -> Result<ReconcileOutcome> {
    let mut outcome = ReconcileOutcome::default();

    for engagement in within_limit(records, Entity::Engagement, limits, &mut outcome) {
        let Some(competition) = engagement.competition.as_ref().filter(|c| c.cp_no.is_some())
        else {
            outcome.skip(
                Entity::Engagement,
                format!("team {} engagement has no competition number", team_id),
            );
            continue;
        };

        let competition_id = get_or_create_competition(tx, competition, season).await?;
        let terrain_id = resolve_venue(tx, engagement.terrain.as_ref()).await?;

        sqlx::query(
            r#"
            INSERT INTO engagements (
                team_id, competition_id, terrain_id, status, general_forfeit,
                round_number, eliminated, phase_number, pool_stage_number
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(team_id, competition_id) DO UPDATE SET
                terrain_id = excluded.terrain_id,
                status = excluded.status,
                general_forfeit = excluded.general_forfeit,
                round_number = excluded.round_number,
                eliminated = excluded.eliminated,
                phase_number = excluded.phase_number,
                pool_stage_number = excluded.pool_stage_number
            "#,
        )
        .bind(team_id)
        .bind(competition_id)
        .bind(terrain_id)
        .bind(&engagement.status)
        .bind(engagement.general_forfeit.as_deref().unwrap_or(FLAG_NO))
        .bind(engagement.round_number)
        .bind(engagement.eliminated.as_deref().unwrap_or(FLAG_NO))
        .bind(engagement.phase.as_ref().and_then(|p| p.number))
        .bind(engagement.poule.as_ref().and_then(|p| p.stage_number))
        .execute(&mut **tx)
        .await?;

        outcome.processed += 1;
    }

    Ok(outcome)
}
