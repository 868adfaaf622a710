//! Match repository: calendar, results and opponent clubs

use crate::error::Result;
use crate::models::{Match, OpponentClub};
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Upcoming fixtures (no score yet) on or after `from`, soonest first
    ///
    /// `from` is a `YYYY-MM-DD` date.
    async fn calendar(&self, from: &str, limit: u32) -> Result<Vec<Match>>;

    /// Played matches, most recent first
    async fn results(&self, limit: u32) -> Result<Vec<Match>>;

    async fn find_by_number(&self, ma_no: i64) -> Result<Option<Match>>;

    /// Matches of one competition in date order
    async fn for_competition(&self, competition_id: i64) -> Result<Vec<Match>>;

    /// Cached display data of an opposing club
    async fn opponent(&self, cl_no: i64) -> Result<Option<OpponentClub>>;

    /// All cached opponents ordered by name
    async fn opponents(&self) -> Result<Vec<OpponentClub>>;
}

pub struct SqliteMatchRepository {
    pool: SqlitePool,
}

impl SqliteMatchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchRepository for SqliteMatchRepository {
    async fn calendar(&self, from: &str, limit: u32) -> Result<Vec<Match>> {
        let matches = query_as::<_, Match>(
            r#"
            SELECT * FROM matches
            WHERE is_result = 0 AND date >= ?
            ORDER BY date ASC, time ASC, ma_no ASC
            LIMIT ?
            "#,
        )
        .bind(from)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(matches)
    }

    async fn results(&self, limit: u32) -> Result<Vec<Match>> {
        let matches = query_as::<_, Match>(
            r#"
            SELECT * FROM matches
            WHERE is_result = 1
            ORDER BY date DESC, time DESC, ma_no DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(matches)
    }

    async fn find_by_number(&self, ma_no: i64) -> Result<Option<Match>> {
        let found = query_as::<_, Match>("SELECT * FROM matches WHERE ma_no = ?")
            .bind(ma_no)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found)
    }

    async fn for_competition(&self, competition_id: i64) -> Result<Vec<Match>> {
        let matches = query_as::<_, Match>(
            "SELECT * FROM matches WHERE competition_id = ? ORDER BY date, time, ma_no",
        )
        .bind(competition_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(matches)
    }

    async fn opponent(&self, cl_no: i64) -> Result<Option<OpponentClub>> {
        let club = query_as::<_, OpponentClub>("SELECT * FROM clubs_cache WHERE cl_no = ?")
            .bind(cl_no)
            .fetch_optional(&self.pool)
            .await?;

        Ok(club)
    }

    async fn opponents(&self) -> Result<Vec<OpponentClub>> {
        let clubs = query_as::<_, OpponentClub>("SELECT * FROM clubs_cache ORDER BY name, cl_no")
            .fetch_all(&self.pool)
            .await?;

        Ok(clubs)
    }
}
