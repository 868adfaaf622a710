//! Club repository: the tracked club, its venues and staff

use crate::error::Result;
use crate::models::{Club, Member, Venue};
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

#[async_trait]
pub trait ClubRepository: Send + Sync {
    /// Find the club by its federation number
    async fn find_by_number(&self, cl_no: i64) -> Result<Option<Club>>;

    /// Venues owned by a club, ordered by name
    async fn venues(&self, club_id: i64) -> Result<Vec<Venue>>;

    /// Find a venue by its federation number
    async fn find_venue(&self, te_no: i64) -> Result<Option<Venue>>;

    /// Staff of a club, ordered by last then first name
    async fn members(&self, club_id: i64) -> Result<Vec<Member>>;
}

pub struct SqliteClubRepository {
    pool: SqlitePool,
}

impl SqliteClubRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClubRepository for SqliteClubRepository {
    async fn find_by_number(&self, cl_no: i64) -> Result<Option<Club>> {
        let club = query_as::<_, Club>("SELECT * FROM club WHERE cl_no = ?")
            .bind(cl_no)
            .fetch_optional(&self.pool)
            .await?;

        Ok(club)
    }

    async fn venues(&self, club_id: i64) -> Result<Vec<Venue>> {
        let venues = query_as::<_, Venue>("SELECT * FROM terrains WHERE club_id = ? ORDER BY name, te_no")
            .bind(club_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(venues)
    }

    async fn find_venue(&self, te_no: i64) -> Result<Option<Venue>> {
        let venue = query_as::<_, Venue>("SELECT * FROM terrains WHERE te_no = ?")
            .bind(te_no)
            .fetch_optional(&self.pool)
            .await?;

        Ok(venue)
    }

    async fn members(&self, club_id: i64) -> Result<Vec<Member>> {
        let members = query_as::<_, Member>(
            "SELECT * FROM members WHERE club_id = ? ORDER BY last_name, first_name, id",
        )
        .bind(club_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::repositories::fixtures;

    #[tokio::test]
    async fn test_find_club_and_venues() {
        let pool = create_test_pool().await.unwrap();
        let club_id = fixtures::club(&pool, 5403).await;
        fixtures::venue(&pool, club_id, 12, "Stade B").await;
        fixtures::venue(&pool, club_id, 11, "Stade A").await;

        let repo = SqliteClubRepository::new(pool);
        let club = repo.find_by_number(5403).await.unwrap().unwrap();
        assert_eq!(club.id, club_id);
        assert_eq!(club.short_name.as_deref(), Some("TEST"));
        assert!(repo.find_by_number(1).await.unwrap().is_none());

        let venues = repo.venues(club_id).await.unwrap();
        assert_eq!(venues.iter().map(|v| v.te_no).collect::<Vec<_>>(), vec![11, 12]);
        assert_eq!(repo.find_venue(12).await.unwrap().unwrap().name, "Stade B");
    }

    #[tokio::test]
    async fn test_members_sorted() {
        let pool = create_test_pool().await.unwrap();
        let club_id = fixtures::club(&pool, 5403).await;
        for (last, first) in [("Martin", "Paul"), ("Bernard", "Anne")] {
            sqlx::query("INSERT INTO members (club_id, last_name, first_name, role) VALUES (?, ?, ?, 'Dirigeant')")
                .bind(club_id)
                .bind(last)
                .bind(first)
                .execute(&pool)
                .await
                .unwrap();
        }

        let repo = SqliteClubRepository::new(pool);
        let members = repo.members(club_id).await.unwrap();
        assert_eq!(members[0].last_name, "Bernard");
        assert_eq!(members[1].first_name, "Paul");
    }
}
