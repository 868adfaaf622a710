//! Seed rows shared by repository tests

use sqlx::{query, query_scalar, SqlitePool};

pub async fn club(pool: &SqlitePool, cl_no: i64) -> i64 {
    query_scalar("INSERT INTO club (cl_no, name, short_name) VALUES (?, 'Club Test', 'TEST') RETURNING id")
        .bind(cl_no)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn venue(pool: &SqlitePool, club_id: i64, te_no: i64, name: &str) -> i64 {
    query_scalar("INSERT INTO terrains (te_no, club_id, name) VALUES (?, ?, ?) RETURNING id")
        .bind(te_no)
        .bind(club_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn team(pool: &SqlitePool, club_id: i64, category: &str, number: i64) -> i64 {
    query_scalar(
        "INSERT INTO teams (club_id, category_code, number, season, diffusable) VALUES (?, ?, ?, 2025, 1) RETURNING id",
    )
    .bind(club_id)
    .bind(category)
    .bind(number)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn competition(pool: &SqlitePool, cp_no: i64, kind: &str, name: &str) -> i64 {
    query_scalar(
        "INSERT INTO competitions (cp_no, season, competition_type, name) VALUES (?, 2025, ?, ?) RETURNING id",
    )
    .bind(cp_no)
    .bind(kind)
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn engagement(pool: &SqlitePool, team_id: i64, competition_id: i64) {
    query("INSERT INTO engagements (team_id, competition_id) VALUES (?, ?)")
        .bind(team_id)
        .bind(competition_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn fixture(
    pool: &SqlitePool,
    ma_no: i64,
    competition_id: i64,
    date: &str,
    scores: Option<(i64, i64)>,
) {
    query(
        r#"
        INSERT INTO matches (
            ma_no, competition_id, season, date, time, home_club_number, away_club_number,
            home_score, away_score, status, is_result
        )
        VALUES (?, ?, 2025, ?, '15:00', 5403, 778899, ?, ?, 'A', ?)
        "#,
    )
    .bind(ma_no)
    .bind(competition_id)
    .bind(date)
    .bind(scores.map(|s| s.0))
    .bind(scores.map(|s| s.1))
    .bind(scores.is_some())
    .execute(pool)
    .await
    .unwrap();
}
