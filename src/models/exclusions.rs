use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::application::Application;
use crate::models::job::SavedJob;
use crate::models::skipped_job::SkippedJob;
use crate::search::exclusion::{ExclusionKey, ExclusionSource, Exclusions};

/// Exclusion sets read from the user's saved jobs, applications and skips.
pub struct PgExclusions {
    pool: PgPool,
}

impl PgExclusions {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn keys(rows: Vec<(String, String, Option<String>)>) -> impl Iterator<Item = ExclusionKey> {
    rows.into_iter()
        .map(|(title, company, location)| ExclusionKey::new(&title, &company, location.as_deref()))
}

#[async_trait]
impl ExclusionSource for PgExclusions {
    async fn load(&self, user_id: i32) -> Result<Exclusions, AppError> {
        let mut saved: HashSet<ExclusionKey> =
            keys(SavedJob::triples(&self.pool, user_id).await?).collect();
        saved.extend(keys(Application::triples(&self.pool, user_id).await?));
        let skipped: HashSet<ExclusionKey> =
            keys(SkippedJob::triples(&self.pool, user_id).await?).collect();

        tracing::debug!(
            "Loaded exclusions for user {user_id}: {} saved, {} skipped",
            saved.len(),
            skipped.len()
        );
        Ok(Exclusions { saved, skipped })
    }
}
