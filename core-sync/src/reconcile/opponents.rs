//! Opponent club cache

use std::collections::HashMap;

use bridge_traits::federation::{MatchRecord, MatchSide};
use core_runtime::BatchLimits;
use sqlx::{Sqlite, Transaction};

use super::{within_limit, Entity, ReconcileOutcome};
use crate::Result;

/// Display data for one opposing club
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpponentEntry {
    pub cl_no: i64,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub logo_url: Option<String>,
}

impl OpponentEntry {
    fn from_side(cl_no: i64, side: &MatchSide) -> Self {
        Self {
            cl_no,
            name: side.short_name.clone(),
            short_name: side.short_name.clone(),
            logo_url: side.logo().map(str::to_string),
        }
    }
}

/// Collect every non-tracked side, one entry per club number
///
/// When a club appears more than once its last occurrence wins. Sides
/// without a club number are ignored.
pub fn collect_opponents<'a>(
    matches: impl IntoIterator<Item = &'a MatchRecord>,
    tracked_club: i64,
) -> Vec<OpponentEntry> {
    let mut entries: Vec<OpponentEntry> = Vec::new();
    let mut positions: HashMap<i64, usize> = HashMap::new();

    for record in matches {
        for side in [record.home.as_ref(), record.away.as_ref()].into_iter().flatten() {
            let Some(cl_no) = side.club_number() else {
                continue;
            };
            if cl_no == tracked_club {
                continue;
            }

            let entry = OpponentEntry::from_side(cl_no, side);
            match positions.get(&cl_no) {
                Some(&index) => entries[index] = entry,
                None => {
                    positions.insert(cl_no, entries.len());
                    entries.push(entry);
                }
            }
        }
    }

    entries
}

/// Upsert opponent entries keyed by `cl_no`
pub async fn reconcile_opponents(
    tx: &mut Transaction<'_, Sqlite>,
    entries: &[OpponentEntry],
    limits: &BatchLimits,
) -> Result<ReconcileOutcome> {
    let mut outcome = ReconcileOutcome::default();

    for entry in within_limit(entries, Entity::Opponent, limits, &mut outcome) {
        sqlx::query(
            r#"
            INSERT INTO clubs_cache (cl_no, name, short_name, logo_url)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(cl_no) DO UPDATE SET
                name = excluded.name,
                short_name = excluded.short_name,
                logo_url = excluded.logo_url
            "#,
        )
        .bind(entry.cl_no)
        .bind(&entry.name)
        .bind(&entry.short_name)
        .bind(&entry.logo_url)
        .execute(&mut **tx)
        .await?;

        outcome.processed += 1;
    }

    Ok(outcome)
}
