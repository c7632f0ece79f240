use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::models::job::{SaveJob, SavedJob, SavedJobFilters};
use crate::search::{DatePosted, SearchQuery, SortBy};
use crate::state::AppState;
use crate::upstream::RawListing;

const DESCRIPTION_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct JobSearchRequest {
    pub query: String,
    #[serde(default)]
    pub location: String,
    pub max_jobs: Option<usize>,
    #[serde(default)]
    pub date_posted: DatePosted,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub force_refresh: bool,
}

/// A search result as handed to clients. Saving or skipping a job sends
/// title, company and location back unchanged.
#[derive(Debug, Serialize, PartialEq)]
pub struct JobView {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub description: String,
    pub url: String,
    pub job_type: String,
    pub posted_date: Option<String>,
}

impl From<&RawListing> for JobView {
    fn from(listing: &RawListing) -> Self {
        let salary = match (listing.salary_min, listing.salary_max) {
            (Some(min), Some(max)) => Some(format!("{} - {}", dollars(min), dollars(max))),
            (Some(only), None) | (None, Some(only)) => Some(dollars(only)),
            (None, None) => None,
        };

        JobView {
            title: listing.title.clone(),
            company: listing.employer_name.clone(),
            location: listing.location(),
            salary,
            description: listing
                .description
                .as_deref()
                .unwrap_or_default()
                .chars()
                .take(DESCRIPTION_PREVIEW_CHARS)
                .collect(),
            url: listing
                .apply_url
                .clone()
                .or_else(|| listing.google_url.clone())
                .unwrap_or_default(),
            job_type: listing.employment_type.clone().unwrap_or_default(),
            posted_date: listing.posted_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// "$120,000"
fn dollars(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

#[derive(Debug, Serialize)]
pub struct JobSearchResponse {
    pub jobs: Vec<JobView>,
    pub message: String,
    pub excluded: usize,
    pub cached: bool,
}

/// POST /api/v1/jobs/search
///
/// Search the provider through the cache. Signed-in users don't see jobs
/// they already saved, applied to or skipped. Results are not saved.
pub async fn search(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(input): Json<JobSearchRequest>,
) -> Result<Json<JobSearchResponse>, AppError> {
    if input.query.trim().is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }

    let query = SearchQuery {
        query: input.query,
        location: input.location,
        date_posted: input.date_posted,
        sort_by: input.sort_by,
        target_count: state.config.job_count(input.max_jobs),
        force_refresh: input.force_refresh,
    };

    let outcome = state.search.search(&query, user.map(|u| u.id)).await?;

    Ok(Json(JobSearchResponse {
        jobs: outcome.listings.iter().map(JobView::from).collect(),
        message: outcome.message,
        excluded: outcome.excluded,
        cached: outcome.cached,
    }))
}

pub async fn list(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Query(filters): Query<SavedJobFilters>,
) -> Result<Json<Vec<SavedJob>>, AppError> {
    let jobs = SavedJob::list(&pool, user.id, &filters).await?;
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/{id}, where id is the numeric id or the generated job_id.
pub async fn get(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<SavedJob>, AppError> {
    let job = SavedJob::get(&pool, user.id, &id).await?;
    Ok(Json(job))
}

pub async fn save(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Json(input): Json<SaveJob>,
) -> Result<Json<SavedJob>, AppError> {
    if input.title.trim().is_empty() || input.company.trim().is_empty() {
        return Err(AppError::BadRequest(
            "title and company are required".to_string(),
        ));
    }
    let job = SavedJob::create(&pool, user.id, input).await?;
    Ok(Json(job))
}

pub async fn delete(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    SavedJob::delete(&pool, user.id, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
