//! Competition repository

use crate::error::Result;
use crate::models::Competition;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

#[async_trait]
pub trait CompetitionRepository: Send + Sync {
    async fn find_by_number(&self, cp_no: i64) -> Result<Option<Competition>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Competition>>;

    /// Competitions of a season, ordered by name
    async fn list_for_season(&self, season: i64) -> Result<Vec<Competition>>;
}

pub struct SqliteCompetitionRepository {
    pool: SqlitePool,
}

impl SqliteCompetitionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompetitionRepository for SqliteCompetitionRepository {
    async fn find_by_number(&self, cp_no: i64) -> Result<Option<Competition>> {
        let competition = query_as::<_, Competition>("SELECT * FROM competitions WHERE cp_no = ?")
            .bind(cp_no)
            .fetch_optional(&self.pool)
            .await?;

        Ok(competition)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Competition>> {
        let competition = query_as::<_, Competition>("SELECT * FROM competitions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(competition)
    }

    async fn list_for_season(&self, season: i64) -> Result<Vec<Competition>> {
        let competitions =
            query_as::<_, Competition>("SELECT * FROM competitions WHERE season = ? ORDER BY name, cp_no")
                .bind(season)
                .fetch_all(&self.pool)
                .await?;

        Ok(competitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::repositories::fixtures;

    #[tokio::test]
    async fn test_lookups() {
        let pool = create_test_pool().await.unwrap();
        let cup = fixtures::competition(&pool, 900, "CP", "Coupe de France").await;
        fixtures::competition(&pool, 400, "CH", "Régional 1").await;

        let repo = SqliteCompetitionRepository::new(pool);
        let found = repo.find_by_number(900).await.unwrap().unwrap();
        assert_eq!(found.id, cup);
        assert_eq!(found.competition_type.as_deref(), Some("CP"));
        assert_eq!(repo.find_by_id(cup).await.unwrap().unwrap().cp_no, 900);
        assert!(repo.find_by_number(1).await.unwrap().is_none());

        let names: Vec<_> = repo
            .list_for_season(2025)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Coupe de France", "Régional 1"]);
    }
}
