//! Team repository

use crate::error::Result;
use crate::models::{Engagement, Team};
use async_trait::async_trait;
use sqlx::{query_as, query_scalar, SqlitePool};

#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Teams of a club for a season, ordered by category then number
    async fn list_for_club(&self, club_id: i64, season: i64) -> Result<Vec<Team>>;

    /// Find a team by its natural key
    async fn find(&self, club_id: i64, category_code: &str, number: i64, season: i64)
        -> Result<Option<Team>>;

    /// Engagements of a team
    async fn engagements(&self, team_id: i64) -> Result<Vec<Engagement>>;

    async fn count(&self) -> Result<i64>;
}

pub struct SqliteTeamRepository {
    pool: SqlitePool,
}

impl SqliteTeamRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for SqliteTeamRepository {
    async fn list_for_club(&self, club_id: i64, season: i64) -> Result<Vec<Team>> {
        let teams = query_as::<_, Team>(
            "SELECT * FROM teams WHERE club_id = ? AND season = ? ORDER BY category_code, number",
        )
        .bind(club_id)
        .bind(season)
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }

    async fn find(
        &self,
        club_id: i64,
        category_code: &str,
        number: i64,
        season: i64,
    ) -> Result<Option<Team>> {
        let team = query_as::<_, Team>(
            "SELECT * FROM teams WHERE club_id = ? AND category_code = ? AND number = ? AND season = ?",
        )
        .bind(club_id)
        .bind(category_code)
        .bind(number)
        .bind(season)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    async fn engagements(&self, team_id: i64) -> Result<Vec<Engagement>> {
        let engagements =
            query_as::<_, Engagement>("SELECT * FROM engagements WHERE team_id = ? ORDER BY competition_id")
                .bind(team_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(engagements)
    }

    async fn count(&self) -> Result<i64> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM teams")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::repositories::fixtures;

    #[tokio::test]
    async fn test_list_and_find() {
        let pool = create_test_pool().await.unwrap();
        let club_id = fixtures::club(&pool, 5403).await;
        fixtures::team(&pool, club_id, "U13", 1).await;
        let seniors = fixtures::team(&pool, club_id, "SEM", 2).await;
        fixtures::team(&pool, club_id, "SEM", 1).await;

        let repo = SqliteTeamRepository::new(pool);
        let teams = repo.list_for_club(club_id, 2025).await.unwrap();
        let keys: Vec<_> = teams
            .iter()
            .map(|t| (t.category_code.as_str(), t.number))
            .collect();
        assert_eq!(keys, vec![("SEM", 1), ("SEM", 2), ("U13", 1)]);
        assert!(teams[0].diffusable);

        let found = repo.find(club_id, "SEM", 2, 2025).await.unwrap().unwrap();
        assert_eq!(found.id, seniors);
        assert!(repo.find(club_id, "SEM", 2, 2024).await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_engagements() {
        let pool = create_test_pool().await.unwrap();
        let club_id = fixtures::club(&pool, 5403).await;
        let team_id = fixtures::team(&pool, club_id, "SEM", 1).await;
        let league = fixtures::competition(&pool, 400, "CH", "Régional 1").await;
        fixtures::engagement(&pool, team_id, league).await;

        let repo = SqliteTeamRepository::new(pool);
        let engagements = repo.engagements(team_id).await.unwrap();
        assert_eq!(engagements.len(), 1);
        assert_eq!(engagements[0].competition_id, league);
        assert_eq!(engagements[0].general_forfeit, "N");
    }
}
