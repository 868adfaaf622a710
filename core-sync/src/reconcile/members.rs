//! Club staff, replaced wholesale on every sync

use bridge_traits::federation::MemberRecord;
use core_runtime::BatchLimits;
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use super::{within_limit, Entity, ReconcileOutcome, ReconcileStrategy};
use crate::Result;

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Replace the club's members with the incoming set
///
/// Members carry no stable identifier, so a changed set is deleted and
/// reinserted. An unchanged set (same people, roles and order) is left alone
/// so row ids stay put across runs. Records missing a last name, first name
/// or role are skipped.
pub async fn reconcile_members(
    tx: &mut Transaction<'_, Sqlite>,
    club_id: i64,
    records: &[MemberRecord],
    limits: &BatchLimits,
) -> Result<ReconcileOutcome> {
    let mut outcome = ReconcileOutcome::default();
    let mut incoming: Vec<(String, String, String)> = Vec::new();

    for member in within_limit(records, Entity::Member, limits, &mut outcome) {
        let (Some(last_name), Some(first_name), Some(role)) = (
            present(&member.last_name),
            present(&member.first_name),
            present(&member.role),
        ) else {
            outcome.skip(Entity::Member, "missing last name, first name or role");
            continue;
        };
        incoming.push((last_name.to_string(), first_name.to_string(), role.to_string()));
    }

    let stored: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT last_name, first_name, role FROM members WHERE club_id = ? ORDER BY id",
    )
    .bind(club_id)
    .fetch_all(&mut **tx)
    .await?;

    if stored == incoming {
        debug!(club_id, members = incoming.len(), "Members unchanged");
        outcome.processed = incoming.len();
        return Ok(outcome);
    }

    if Entity::Member.strategy() == ReconcileStrategy::ReplaceAll {
        let removed = sqlx::query("DELETE FROM members WHERE club_id = ?")
            .bind(club_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();
        debug!(club_id, removed, "Cleared members");
    }

    for (last_name, first_name, role) in &incoming {
        sqlx::query("INSERT INTO members (club_id, last_name, first_name, role) VALUES (?, ?, ?, ?)")
            .bind(club_id)
            .bind(last_name)
            .bind(first_name)
            .bind(role)
            .execute(&mut **tx)
            .await?;

        outcome.processed += 1;
    }

    Ok(outcome)
}
