use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::AppError;

/// A search result the user asked not to see again.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SkippedJob {
    pub id: i32,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub skipped_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SkipJob {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
}

impl SkippedJob {
    pub async fn list(pool: &PgPool, user_id: i32) -> Result<Vec<SkippedJob>, AppError> {
        let jobs = sqlx::query_as::<_, SkippedJob>(
            "SELECT id, title, company, location, skipped_at FROM skipped_jobs WHERE user_id = $1 ORDER BY skipped_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(jobs)
    }

    /// Record a skip. Skipping the same triple again is a no-op.
    /// Returns whether a new row was written.
    pub async fn skip(pool: &PgPool, user_id: i32, input: &SkipJob) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO skipped_jobs (user_id, title, company, location) VALUES ($1, $2, $3, $4) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(input.title.trim())
        .bind(input.company.trim())
        .bind(input.location.as_deref().map(str::trim))
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn unskip(pool: &PgPool, user_id: i32, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM skipped_jobs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Skipped job {id} not found")));
        }
        Ok(())
    }

    pub async fn triples(
        pool: &PgPool,
        user_id: i32,
    ) -> Result<Vec<(String, String, Option<String>)>, AppError> {
        let rows = sqlx::query_as(
            "SELECT title, company, location FROM skipped_jobs WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
