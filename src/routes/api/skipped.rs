use axum::Json;
use axum::extract::{Path, State};
use sqlx::PgPool;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::skipped_job::{SkipJob, SkippedJob};

pub async fn list(
    State(pool): State<PgPool>,
    user: CurrentUser,
) -> Result<Json<Vec<SkippedJob>>, AppError> {
    let jobs = SkippedJob::list(&pool, user.id).await?;
    Ok(Json(jobs))
}

/// POST /api/v1/jobs/skip
///
/// Hide a job from future searches. Idempotent.
pub async fn skip(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Json(input): Json<SkipJob>,
) -> Result<Json<serde_json::Value>, AppError> {
    if input.title.trim().is_empty() || input.company.trim().is_empty() {
        return Err(AppError::BadRequest(
            "title and company are required".to_string(),
        ));
    }
    let created = SkippedJob::skip(&pool, user.id, &input).await?;
    let message = if created {
        "Job skipped"
    } else {
        "Job already skipped"
    };
    Ok(Json(serde_json::json!({ "message": message })))
}

pub async fn unskip(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    SkippedJob::unskip(&pool, user.id, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
