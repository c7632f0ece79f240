use axum::Json;
use axum::extract::{Path, Query, State};
use sqlx::PgPool;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::models::application::{
    Application, ApplicationFilters, CreateApplication, UpdateApplication,
};

pub async fn list(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Query(filters): Query<ApplicationFilters>,
) -> Result<Json<Vec<Application>>, AppError> {
    let apps = Application::list(&pool, user.id, &filters).await?;
    Ok(Json(apps))
}

pub async fn get(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Application>, AppError> {
    let app = Application::get(&pool, user.id, id).await?;
    Ok(Json(app))
}

pub async fn create(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Json(input): Json<CreateApplication>,
) -> Result<Json<Application>, AppError> {
    let app = Application::create(&pool, user.id, input).await?;
    Ok(Json(app))
}

pub async fn update(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(id): Path<i32>,
    Json(input): Json<UpdateApplication>,
) -> Result<Json<Application>, AppError> {
    let app = Application::update(&pool, user.id, id, input).await?;
    Ok(Json(app))
}

pub async fn delete(
    State(pool): State<PgPool>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    Application::delete(&pool, user.id, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
