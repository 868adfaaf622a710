//! Record builders shared by unit tests

use bridge_traits::federation::{
    ClubRef, CompetitionRecord, EngagementRecord, MatchRecord, MatchSide, PoolRef, StandingRecord,
    StandingTeam, TeamRecord, VenueReference,
};
use sqlx::SqlitePool;

pub const TRACKED_CLUB: i64 = 5403;

pub fn competition(cp_no: i64, kind: &str) -> CompetitionRecord {
    CompetitionRecord {
        cp_no: Some(cp_no),
        season: Some(2025),
        competition_type: Some(kind.to_string()),
        name: Some(format!("Competition {}", cp_no)),
        ..CompetitionRecord::default()
    }
}

pub fn side(cl_no: i64, name: &str) -> MatchSide {
    MatchSide {
        club: Some(ClubRef {
            cl_no: Some(cl_no),
            logo: Some(format!("https://logos.test/{}.png", cl_no)),
        }),
        category_code: Some("SEM".to_string()),
        number: Some(1),
        short_name: Some(name.to_string()),
    }
}

pub fn fixture(ma_no: i64, competition: CompetitionRecord, date: &str) -> MatchRecord {
    MatchRecord {
        ma_no: Some(ma_no),
        competition: Some(competition),
        season: Some(2025),
        date: Some(date.to_string()),
        time: Some("15H00".to_string()),
        home: Some(side(TRACKED_CLUB, "ES Val")),
        away: Some(side(9001, "AS Voisins")),
        status: Some("A".to_string()),
        ..MatchRecord::default()
    }
}

pub fn result(ma_no: i64, competition: CompetitionRecord, date: &str, score: (i64, i64)) -> MatchRecord {
    MatchRecord {
        home_score: Some(score.0),
        away_score: Some(score.1),
        ..fixture(ma_no, competition, date)
    }
}

pub fn engagement(competition: CompetitionRecord, terrain: Option<VenueReference>) -> EngagementRecord {
    EngagementRecord {
        competition: Some(competition),
        terrain,
        status: Some("E".to_string()),
        ..EngagementRecord::default()
    }
}

pub fn team(category: &str, number: i64, engagements: Vec<EngagementRecord>) -> TeamRecord {
    TeamRecord {
        category_code: Some(category.to_string()),
        number: Some(number),
        short_name: Some(format!("ES Val {}", category)),
        competition_type: Some("CH".to_string()),
        season: Some(2025),
        diffusable: true,
        engagements,
        ..TeamRecord::default()
    }
}

pub fn standing(competition: CompetitionRecord, cj_no: i64, cl_no: i64, rank: i64) -> StandingRecord {
    StandingRecord {
        competition: Some(competition),
        season: Some(2025),
        date: Some("2025-09-14T00:00:00+00:00".to_string()),
        cj_no: Some(cj_no),
        ranking_type: Some("G".to_string()),
        team: Some(StandingTeam {
            club: Some(ClubRef {
                cl_no: Some(cl_no),
                logo: None,
            }),
            category_code: Some("SEM".to_string()),
            number: Some(1),
            short_name: Some(format!("Club {}", cl_no)),
        }),
        rank: Some(rank),
        point_count: Some(3 * (10 - rank)),
        total_games_count: Some(3),
        poule: Some(PoolRef {
            stage_number: Some(1),
            name: Some("Poule A".to_string()),
            cdg: None,
        }),
        ..StandingRecord::default()
    }
}

pub async fn seed_club(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar::<_, i64>("INSERT INTO club (cl_no, name) VALUES (?, 'ES Val') RETURNING id")
        .bind(TRACKED_CLUB)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}
