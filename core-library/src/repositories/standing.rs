//! League standings repository

use crate::error::Result;
use crate::models::Standing;
use async_trait::async_trait;
use sqlx::{query_as, query_scalar, SqlitePool};

#[async_trait]
pub trait StandingRepository: Send + Sync {
    /// Table of the latest stored matchday of a competition, ordered by rank
    async fn latest_table(&self, competition_id: i64, ranking_type: &str) -> Result<Vec<Standing>>;

    /// All rows of a competition
    async fn for_competition(&self, competition_id: i64) -> Result<Vec<Standing>>;
}

pub struct SqliteStandingRepository {
    pool: SqlitePool,
}

impl SqliteStandingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StandingRepository for SqliteStandingRepository {
    async fn latest_table(&self, competition_id: i64, ranking_type: &str) -> Result<Vec<Standing>> {
        let latest = query_scalar::<_, Option<i64>>(
            "SELECT MAX(cj_no) FROM standings WHERE competition_id = ? AND ranking_type = ?",
        )
        .bind(competition_id)
        .bind(ranking_type)
        .fetch_one(&self.pool)
        .await?;

        let Some(cj_no) = latest else {
            return Ok(Vec::new());
        };

        let rows = query_as::<_, Standing>(
            r#"
            SELECT * FROM standings
            WHERE competition_id = ? AND ranking_type = ? AND cj_no = ?
            ORDER BY ranking, cl_no
            "#,
        )
        .bind(competition_id)
        .bind(ranking_type)
        .bind(cj_no)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn for_competition(&self, competition_id: i64) -> Result<Vec<Standing>> {
        let rows = query_as::<_, Standing>(
            "SELECT * FROM standings WHERE competition_id = ? ORDER BY cj_no, ranking_type, ranking",
        )
        .bind(competition_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
