use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;
use verdict::AnalysisReport;

/// Persist one finished report. The full report body is stored as JSONB so
/// retrieval does not re-shape anything.
pub async fn insert_report(
    pool: &PgPool,
    id: Uuid,
    uploader: &str,
    kind: &str,
    report: &AnalysisReport,
    body: serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO results (id, uploader, kind, trust_score, verdict, report)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(uploader)
    .bind(kind)
    .bind(report.trust_score as i16)
    .bind(report.verdict.to_string())
    .bind(body)
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(sqlx::FromRow)]
pub struct ResultRow {
    pub id: Uuid,
    pub uploader: String,
    pub kind: String,
    pub report: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

pub async fn fetch_report(pool: &PgPool, id: Uuid) -> Result<Option<ResultRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, uploader, kind, report, created_at
        FROM results
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

#[derive(Serialize, sqlx::FromRow)]
pub struct HistoryRow {
    pub id: Uuid,
    pub kind: String,
    pub trust_score: i16,
    pub verdict: String,
    pub created_at: DateTime<Utc>,
}

pub async fn history(
    pool: &PgPool,
    uploader: &str,
    limit: i64,
) -> Result<Vec<HistoryRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, kind, trust_score, verdict, created_at
        FROM results
        WHERE uploader = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(uploader)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
