//! Reference resolution inside the sync transaction
//!
//! Competitions are created on first reference and never updated afterwards.
//! Venue references come in several shapes and resolve to an internal id
//! only when the venue is already stored.

use bridge_traits::federation::{CompetitionRecord, VenueReference};
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use crate::datetime::optional_timestamp;
use crate::{Result, SyncError};

const VENUE_IRI_PREFIX: &str = "/api/terrains/";

/// Return the internal id of a competition, inserting it on first sight
///
/// A stored competition is returned unchanged even when the incoming record
/// differs. Season defaults to `default_season` and name to `Unknown`.
///
/// # Errors
///
/// `SyncError::MissingReference` when the record has no `cp_no`.
pub async fn get_or_create_competition(
    tx: &mut Transaction<'_, Sqlite>,
    record: &CompetitionRecord,
    default_season: i64,
) -> Result<i64> {
    let cp_no = record.cp_no.ok_or_else(|| SyncError::MissingReference {
        entity: "competition".to_string(),
        detail: format!(
            "record without cp_no (name: {})",
            record.name.as_deref().unwrap_or("none")
        ),
    })?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM competitions WHERE cp_no = ?")
        .bind(cp_no)
        .fetch_optional(&mut **tx)
        .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let cdg = record.cdg.as_ref();
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO competitions (
            cp_no, season, competition_type, name, level, cdg_cg_no, cdg_name, external_updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(cp_no)
    .bind(record.season.unwrap_or(default_season))
    .bind(&record.competition_type)
    .bind(record.name.as_deref().unwrap_or("Unknown"))
    .bind(&record.level)
    .bind(cdg.and_then(|c| c.cg_no))
    .bind(cdg.and_then(|c| c.name.clone()))
    .bind(optional_timestamp(record.external_updated_at.as_deref()))
    .fetch_one(&mut **tx)
    .await?;

    debug!(cp_no, id, "Created competition");
    Ok(id)
}

/// Extract the venue number from a reference
///
/// Accepts a number, a numeric string, an IRI such as `/api/terrains/42`, or
/// an embedded object with `te_no`. Zero and unrecognised shapes give `None`.
pub fn parse_venue_number(reference: &VenueReference) -> Option<i64> {
    let number = match reference {
        VenueReference::Number(n) => Some(*n),
        VenueReference::Text(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.strip_prefix(VENUE_IRI_PREFIX)
                    .and_then(|rest| rest.trim_end_matches('/').parse::<i64>().ok())
            })
        }
        VenueReference::Embedded { te_no } => *te_no,
    };

    number.filter(|n| *n > 0)
}

/// Resolve a venue reference to the internal venue id, if the venue is stored
pub async fn resolve_venue(
    tx: &mut Transaction<'_, Sqlite>,
    reference: Option<&VenueReference>,
) -> Result<Option<i64>> {
    let Some(te_no) = reference.and_then(parse_venue_number) else {
        return Ok(None);
    };

    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM terrains WHERE te_no = ?")
        .bind(te_no)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(id)
}
