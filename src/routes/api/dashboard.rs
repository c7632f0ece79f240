use axum::Json;
use axum::extract::State;
use sqlx::PgPool;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::application::{Application, ApplicationStats};

/// GET /api/v1/dashboard/stats
pub async fn stats(
    State(pool): State<PgPool>,
    user: CurrentUser,
) -> Result<Json<ApplicationStats>, AppError> {
    let stats = Application::stats(&pool, user.id).await?;
    Ok(Json(stats))
}
