//! Venue (terrain) upsert

use bridge_traits::federation::VenueRecord;
use core_runtime::BatchLimits;
use sqlx::{Sqlite, Transaction};

use super::{within_limit, Entity, ReconcileOutcome};
use crate::Result;

/// Upsert the club's venues keyed by `te_no`
///
/// Venues missing their number or name are skipped. Venues no longer in the
/// payload are kept, since matches and engagements may still point at them.
pub async fn reconcile_venues(
    tx: &mut Transaction<'_, Sqlite>,
    club_id: i64,
    records: &[VenueRecord],
    limits: &BatchLimits,
) -> Result<ReconcileOutcome> {
    let mut outcome = ReconcileOutcome::default();

    for venue in within_limit(records, Entity::Venue, limits, &mut outcome) {
        let Some(te_no) = venue.te_no.filter(|n| *n > 0) else {
            outcome.skip(Entity::Venue, "missing te_no");
            continue;
        };
        let Some(name) = venue.name.as_deref().filter(|n| !n.trim().is_empty()) else {
            outcome.skip(Entity::Venue, format!("te_no {} has no name", te_no));
            continue;
        };

        sqlx::query(
            r#"
            INSERT INTO terrains (
                te_no, club_id, name, zip_code, city, address, latitude, longitude, surface_type
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(te_no) DO UPDATE SET
                club_id = excluded.club_id,
                name = excluded.name,
                zip_code = excluded.zip_code,
                city = excluded.city,
                address = excluded.address,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                surface_type = excluded.surface_type
            "#,
        )
        .bind(te_no)
        .bind(club_id)
        .bind(name)
        .bind(&venue.zip_code)
        .bind(&venue.city)
        .bind(&venue.address)
        .bind(venue.latitude)
        .bind(venue.longitude)
        .bind(&venue.surface_type)
        .execute(&mut **tx)
        .await?;

        outcome.processed += 1;
    }

    Ok(outcome)
}
