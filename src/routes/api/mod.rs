pub mod applications;
pub mod dashboard;
pub mod jobs;
pub mod skipped;

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};

use crate::auth::identify;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Search and saved jobs
        .route("/jobs/search", post(jobs::search))
        .route("/jobs", get(jobs::list).post(jobs::save))
        .route("/jobs/{id}", get(jobs::get).delete(jobs::delete))
        // Skipped jobs
        .route("/jobs/skip", post(skipped::skip))
        .route("/jobs/skipped", get(skipped::list))
        .route("/jobs/skipped/{id}", delete(skipped::unskip))
        // Applications
        .route(
            "/applications",
            get(applications::list).post(applications::create),
        )
        .route(
            "/applications/{id}",
            get(applications::get)
                .put(applications::update)
                .patch(applications::update)
                .delete(applications::delete),
        )
        .route("/dashboard/stats", get(dashboard::stats))
        .layer(middleware::from_fn_with_state(
            state.pool.clone(),
            identify,
        ))
        .with_state(state);

    Router::new().nest("/api/v1", api)
}
