use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::AppError;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Application {
    pub id: i32,
    pub user_id: i32,
    pub job_title: String,
    pub company: String,
    pub location: Option<String>,
    pub job_url: Option<String>,
    pub job_description: Option<String>,
    pub status: String,
    pub applied_date: DateTime<Utc>,
    pub deadline: Option<NaiveDate>,
    pub follow_up_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateApplication {
    pub job_title: String,
    pub company: String,
    pub location: Option<String>,
    pub job_url: Option<String>,
    pub job_description: Option<String>,
    pub status: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub follow_up_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateApplication {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_url: Option<String>,
    pub job_description: Option<String>,
    pub status: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub follow_up_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl UpdateApplication {
    pub fn is_empty(&self) -> bool {
        self.job_title.is_none()
            && self.company.is_none()
            && self.location.is_none()
            && self.job_url.is_none()
            && self.job_description.is_none()
            && self.status.is_none()
            && self.deadline.is_none()
            && self.follow_up_date.is_none()
            && self.notes.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplicationFilters {
    pub status: Option<String>,
    /// Only future deadlines, soonest first.
    #[serde(default)]
    pub upcoming_deadlines: bool,
}

/// Per-user application counts for the dashboard.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct ApplicationStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    /// Deadlines from today through the next 7 days.
    pub upcoming_deadlines: i64,
    /// Applied within the last 7 days.
    pub applications_this_week: i64,
}

impl Application {
    pub async fn list(
        pool: &PgPool,
        user_id: i32,
        filters: &ApplicationFilters,
    ) -> Result<Vec<Application>, AppError> {
        let sql = if filters.upcoming_deadlines {
            "SELECT * FROM applications WHERE user_id = $1 AND ($2::text IS NULL OR status = $2) AND deadline IS NOT NULL AND deadline > CURRENT_DATE ORDER BY deadline ASC"
        } else {
            "SELECT * FROM applications WHERE user_id = $1 AND ($2::text IS NULL OR status = $2) ORDER BY applied_date DESC"
        };
        let apps = sqlx::query_as::<_, Application>(sql)
            .bind(user_id)
            .bind(&filters.status)
            .fetch_all(pool)
            .await?;
        Ok(apps)
    }

    pub async fn get(pool: &PgPool, user_id: i32, id: i32) -> Result<Application, AppError> {
        sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
    }

    pub async fn create(
        pool: &PgPool,
        user_id: i32,
        input: CreateApplication,
    ) -> Result<Application, AppError> {
        let status = input.status.unwrap_or_else(|| "applied".to_string());
        let app = sqlx::query_as::<_, Application>(
            "INSERT INTO applications (user_id, job_title, company, location, job_url, job_description, status, deadline, follow_up_date, notes) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(user_id)
        .bind(&input.job_title)
        .bind(&input.company)
        .bind(&input.location)
        .bind(&input.job_url)
        .bind(&input.job_description)
        .bind(&status)
        .bind(input.deadline)
        .bind(input.follow_up_date)
        .bind(&input.notes)
        .fetch_one(pool)
        .await?;
        Ok(app)
    }

    pub async fn update(
        pool: &PgPool,
        user_id: i32,
        id: i32,
        input: UpdateApplication,
    ) -> Result<Application, AppError> {
        if input.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        let existing = Self::get(pool, user_id, id).await?;
        let app = sqlx::query_as::<_, Application>(
            "UPDATE applications SET job_title = $3, company = $4, location = $5, job_url = $6, job_description = $7, status = $8, deadline = $9, follow_up_date = $10, notes = $11, updated_at = NOW() WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(input.job_title.unwrap_or(existing.job_title))
        .bind(input.company.unwrap_or(existing.company))
        .bind(input.location.or(existing.location))
        .bind(input.job_url.or(existing.job_url))
        .bind(input.job_description.or(existing.job_description))
        .bind(input.status.unwrap_or(existing.status))
        .bind(input.deadline.or(existing.deadline))
        .bind(input.follow_up_date.or(existing.follow_up_date))
        .bind(input.notes.or(existing.notes))
        .fetch_one(pool)
        .await?;
        Ok(app)
    }

    pub async fn delete(pool: &PgPool, user_id: i32, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Application {id} not found")));
        }
        Ok(())
    }

    pub async fn stats(pool: &PgPool, user_id: i32) -> Result<ApplicationStats, AppError> {
        let by_status: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM applications WHERE user_id = $1 GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let (upcoming_deadlines, applications_this_week): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE deadline BETWEEN CURRENT_DATE AND CURRENT_DATE + 7), COUNT(*) FILTER (WHERE applied_date >= NOW() - INTERVAL '7 days') FROM applications WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(ApplicationStats {
            total: by_status.iter().map(|(_, count)| count).sum(),
            by_status: by_status.into_iter().collect(),
            upcoming_deadlines,
            applications_this_week,
        })
    }

    /// (title, company, location) of every application; applied-to jobs count
    /// as saved for search exclusion.
    pub async fn triples(
        pool: &PgPool,
        user_id: i32,
    ) -> Result<Vec<(String, String, Option<String>)>, AppError> {
        let rows = sqlx::query_as(
            "SELECT job_title, company, location FROM applications WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
