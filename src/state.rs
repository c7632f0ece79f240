use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::Config;
use crate::search::JobSearch;

/// Shared application state injected into route handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub search: Arc<JobSearch>,
    pub config: Arc<Config>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
