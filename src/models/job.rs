use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::AppError;

/// A job a user saved from search results.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SavedJob {
    pub id: i32,
    pub user_id: i32,
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub source: String,
    pub posted_date: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SaveJob {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub job_type: Option<String>,
    pub posted_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SavedJobFilters {
    /// Case-insensitive substring match.
    pub company: Option<String>,
    /// Case-insensitive prefix match.
    pub location: Option<String>,
}

/// Short opaque id for a saved job, distinct from the numeric row id.
fn new_job_id() -> String {
    uuid::Uuid::new_v4().to_string()[..20].to_string()
}

impl SavedJob {
    pub async fn list(
        pool: &PgPool,
        user_id: i32,
        filters: &SavedJobFilters,
    ) -> Result<Vec<SavedJob>, AppError> {
        let jobs = sqlx::query_as::<_, SavedJob>(
            "SELECT * FROM jobs WHERE user_id = $1 AND ($2::text IS NULL OR company ILIKE '%' || $2 || '%') AND ($3::text IS NULL OR location ILIKE $3 || '%') ORDER BY id DESC",
        )
        .bind(user_id)
        .bind(&filters.company)
        .bind(&filters.location)
        .fetch_all(pool)
        .await?;
        Ok(jobs)
    }

    /// Look up by numeric id or by the generated job_id.
    pub async fn get(pool: &PgPool, user_id: i32, id: &str) -> Result<SavedJob, AppError> {
        let numeric = id.parse::<i32>().ok();
        sqlx::query_as::<_, SavedJob>(
            "SELECT * FROM jobs WHERE user_id = $1 AND (id = $2 OR job_id = $3) LIMIT 1",
        )
        .bind(user_id)
        .bind(numeric)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
    }

    pub async fn create(pool: &PgPool, user_id: i32, input: SaveJob) -> Result<SavedJob, AppError> {
        let job = sqlx::query_as::<_, SavedJob>(
            "INSERT INTO jobs (user_id, job_id, title, company, location, salary, job_type, description, url, source, posted_date) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'user_saved', $10) RETURNING *",
        )
        .bind(user_id)
        .bind(new_job_id())
        .bind(&input.title)
        .bind(&input.company)
        .bind(&input.location)
        .bind(&input.salary)
        .bind(&input.job_type)
        .bind(&input.description)
        .bind(&input.url)
        .bind(input.posted_date)
        .fetch_one(pool)
        .await?;
        Ok(job)
    }

    pub async fn delete(pool: &PgPool, user_id: i32, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Job {id} not found")));
        }
        Ok(())
    }

    /// (title, company, location) of every saved job, for search exclusion.
    pub async fn triples(
        pool: &PgPool,
        user_id: i32,
    ) -> Result<Vec<(String, String, Option<String>)>, AppError> {
        let rows = sqlx::query_as("SELECT title, company, location FROM jobs WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_are_short_and_unique() {
        let a = new_job_id();
        assert_eq!(a.len(), 20);
        assert_ne!(a, new_job_id());
    }
}
