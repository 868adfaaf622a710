//! Club identity upsert

use bridge_traits::federation::ClubRecord;
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use crate::Result;

/// Upsert the tracked club and return its internal id
///
/// The club row is keyed by `cl_no`; when the payload omits it the configured
/// club number is used, since the payload was fetched for that club.
pub async fn reconcile_club(
    tx: &mut Transaction<'_, Sqlite>,
    record: &ClubRecord,
    club_number: i64,
) -> Result<i64> {
    let cl_no = record.cl_no.unwrap_or(club_number);
    let name = record
        .name
        .clone()
        .or_else(|| record.short_name.clone())
        .unwrap_or_else(|| format!("Club {}", cl_no));
    let district = record.district.as_ref();

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO club (
            cl_no, affiliation_number, name, short_name, location, colors,
            address1, address2, address3, postal_code, distributor_office,
            latitude, longitude, logo_url, district_name, district_cg_no
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(cl_no) DO UPDATE SET
            affiliation_number = excluded.affiliation_number,
            name = excluded.name,
            short_name = excluded.short_name,
            location = excluded.location,
            colors = excluded.colors,
            address1 = excluded.address1,
            address2 = excluded.address2,
            address3 = excluded.address3,
            postal_code = excluded.postal_code,
            distributor_office = excluded.distributor_office,
            latitude = excluded.latitude,
            longitude = excluded.longitude,
            logo_url = excluded.logo_url,
            district_name = excluded.district_name,
            district_cg_no = excluded.district_cg_no
        RETURNING id
        "#,
    )
    .bind(cl_no)
    .bind(&record.affiliation_number)
    .bind(&name)
    .bind(&record.short_name)
    .bind(&record.location)
    .bind(&record.colors)
    .bind(&record.address1)
    .bind(&record.address2)
    .bind(&record.address3)
    .bind(&record.postal_code)
    .bind(&record.distributor_office)
    .bind(record.latitude)
    .bind(record.longitude)
    .bind(&record.logo)
    .bind(district.and_then(|d| d.name.clone()))
    .bind(district.and_then(|d| d.cg_no))
    .fetch_one(&mut **tx)
    .await?;

    debug!(cl_no, id, "Club upserted");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::federation::GoverningBodyRef;
    use core_library::db::create_test_pool;
    use core_library::models::Club;

    fn record(name: &str) -> ClubRecord {
        ClubRecord {
            cl_no: Some(5403),
            name: Some(name.to_string()),
            short_name: Some("ES VAL".to_string()),
            latitude: Some(45.76),
            logo: Some("https://logos.test/5403.png".to_string()),
            district: Some(GoverningBodyRef {
                cg_no: Some(42),
                name: Some("District du Rhône".to_string()),
            }),
            ..ClubRecord::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_id() {
        let pool = create_test_pool().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        let first = reconcile_club(&mut tx, &record("ENTENTE SPORTIVE DU VAL"), 5403).await.unwrap();
        let second = reconcile_club(&mut tx, &record("ES DU VAL"), 5403).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first, second);
        let club: Club = sqlx::query_as("SELECT * FROM club").fetch_one(&pool).await.unwrap();
        assert_eq!(club.name, "ES DU VAL");
        assert_eq!(club.district_cg_no, Some(42));
        assert_eq!(club.logo_url.as_deref(), Some("https://logos.test/5403.png"));
    }

    #[tokio::test]
    async fn test_missing_number_and_name_fall_back() {
        let pool = create_test_pool().await.unwrap();
        let record = ClubRecord {
            short_name: Some("ES VAL".to_string()),
            ..ClubRecord::default()
        };

        let mut tx = pool.begin().await.unwrap();
        reconcile_club(&mut tx, &record, 5403).await.unwrap();
        tx.commit().await.unwrap();

        let club: Club = sqlx::query_as("SELECT * FROM club").fetch_one(&pool).await.unwrap();
        assert_eq!(club.cl_no, 5403);
        assert_eq!(club.name, "ES VAL");
    }
}
