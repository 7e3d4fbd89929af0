//! Import job queries

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::types::{ImportJob, ImportState, ImportSummary};

#[derive(Debug, FromRow)]
struct ImportJobRow {
    id: Uuid,
    user_id: Uuid,
    state: ImportState,
    source_name: Option<String>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    summary: Option<Json<ImportSummary>>,
    created_at: DateTime<Utc>,
}

impl From<ImportJobRow> for ImportJob {
    fn from(row: ImportJobRow) -> Self {
        Self {
            id: row.id,
            account_id: row.user_id,
            state: row.state,
            source_name: row.source_name,
            started_at: row.started_at,
            ended_at: row.ended_at,
            summary: row.summary.map(|Json(summary)| summary),
            created_at: row.created_at,
        }
    }
}

/// Create a queued job
pub async fn create_import_job(
    conn: &mut PgConnection,
    user_id: Uuid,
    source_name: Option<&str>,
) -> Result<ImportJob> {
    let row = sqlx::query_as::<_, ImportJobRow>(
        r#"
        INSERT INTO import_jobs (id, user_id, state, source_name)
        VALUES ($1, $2, 'queued', $3)
        RETURNING id, user_id, state, source_name, started_at, ended_at, summary, created_at
        "#
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(source_name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

pub async fn get_import_job(conn: &mut PgConnection, job_id: Uuid) -> Result<Option<ImportJob>> {
    let row = sqlx::query_as::<_, ImportJobRow>(
        r#"
        SELECT id, user_id, state, source_name, started_at, ended_at, summary, created_at
        FROM import_jobs
        WHERE id = $1
        "#
    )
    .bind(job_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Into::into))
}

/// queued -> processing; false if the job is not queued
pub async fn mark_import_job_processing(
    conn: &mut PgConnection,
    job_id: Uuid,
    started_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE import_jobs
        SET state = 'processing', started_at = $2
        WHERE id = $1 AND state = 'queued'
        "#
    )
    .bind(job_id)
    .bind(started_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// processing -> terminal state with the final summary; false if the job
/// is not processing, so a written summary is never replaced
pub async fn finish_import_job(
    conn: &mut PgConnection,
    job_id: Uuid,
    state: ImportState,
    ended_at: DateTime<Utc>,
    summary: &ImportSummary,
) -> Result<bool> {
    if !state.is_terminal() {
        anyhow::bail!("Cannot finish import job {} as {}", job_id, state);
    }

    let result = sqlx::query(
        r#"
        UPDATE import_jobs
        SET state = $2, ended_at = $3, summary = $4
        WHERE id = $1 AND state = 'processing'
        "#
    )
    .bind(job_id)
    .bind(state)
    .bind(ended_at)
    .bind(Json(summary))
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Jobs in one state, oldest first. Used at startup to find jobs a
/// stopped worker left queued or processing.
pub async fn list_import_jobs_in_state(
    conn: &mut PgConnection,
    state: ImportState,
) -> Result<Vec<ImportJob>> {
    let rows = sqlx::query_as::<_, ImportJobRow>(
        r#"
        SELECT id, user_id, state, source_name, started_at, ended_at, summary, created_at
        FROM import_jobs
        WHERE state = $1
        ORDER BY created_at ASC
        "#
    )
    .bind(state)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}
