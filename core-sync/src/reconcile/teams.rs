//! Team roster upsert

use bridge_traits::federation::TeamRecord;
use core_runtime::BatchLimits;
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use super::{reconcile_engagements, within_limit, Entity, ReconcileOutcome};
use crate::Result;

/// Counters for a roster pass: teams and the engagements nested in them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterOutcome {
    pub teams: ReconcileOutcome,
    pub engagements: ReconcileOutcome,
}

impl RosterOutcome {
    pub fn warnings(&self) -> impl Iterator<Item = &String> {
        self.teams.warnings.iter().chain(self.engagements.warnings.iter())
    }
}

/// Upsert each team, then reconcile its engagements
///
/// Teams are keyed by (club, category code, number, season); the season
/// falls back to `season` when the payload omits it. Teams missing their
/// category code or number are skipped.
pub async fn reconcile_teams(
    tx: &mut Transaction<'_, Sqlite>,
    club_id: i64,
    records: &[TeamRecord],
    limits: &BatchLimits,
    season: i64,
) -> Result<RosterOutcome> {
    let mut outcome = RosterOutcome::default();

    for team in within_limit(records, Entity::Team, limits, &mut outcome.teams) {
        let Some(category_code) = team.category_code.as_deref().filter(|c| !c.trim().is_empty())
        else {
            outcome.teams.skip(Entity::Team, "missing category_code");
            continue;
        };
        let Some(number) = team.number else {
            outcome
                .teams
                .skip(Entity::Team, format!("{} has no team number", category_code));
            continue;
        };
        let team_season = team.season.unwrap_or(season);

        let team_id = upsert_team(tx, club_id, category_code, number, team_season, team).await?;
        outcome.teams.processed += 1;

        let engagements =
            reconcile_engagements(tx, team_id, &team.engagements, limits, season).await?;
        outcome.engagements.merge(engagements);
    }

    Ok(outcome)
}

async fn upsert_team(
    tx: &mut Transaction<'_, Sqlite>,
    club_id: i64,
    category_code: &str,
    number: i64,
    season: i64,
    team: &TeamRecord,
) -> Result<i64> {
    // The update only fires when a column changed; RETURNING then yields no row.
    let returned = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO teams (
            club_id, category_code, number, code, short_name, competition_type,
            season, category_label, category_gender, diffusable
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(club_id, category_code, number, season) DO UPDATE SET
            code = excluded.code,
            short_name = excluded.short_name,
            competition_type = excluded.competition_type,
            category_label = excluded.category_label,
            category_gender = excluded.category_gender,
            diffusable = excluded.diffusable
        WHERE teams.code IS NOT excluded.code
            OR teams.short_name IS NOT excluded.short_name
            OR teams.competition_type IS NOT excluded.competition_type
            OR teams.category_label IS NOT excluded.category_label
            OR teams.category_gender IS NOT excluded.category_gender
            OR teams.diffusable IS NOT excluded.diffusable
        RETURNING id
        "#,
    )
    .bind(club_id)
    .bind(category_code)
    .bind(number)
    .bind(&team.code)
    .bind(&team.short_name)
    .bind(&team.competition_type)
    .bind(season)
    .bind(&team.category_label)
    .bind(&team.category_gender)
    .bind(team.diffusable)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(id) = returned {
        return Ok(id);
    }

    debug!(category_code, number, season, "Team unchanged");
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM teams WHERE club_id = ? AND category_code = ? AND number = ? AND season = ?",
    )
    .bind(club_id)
    .bind(category_code)
    .bind(number)
    .bind(season)
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}
