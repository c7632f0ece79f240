// Upstream job search providers.
// Defines the page-fetching trait and the raw listing shape shared by the cache.

pub mod jsearch;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::search::{DatePosted, SortBy};

/// A single job record as returned by the provider. Never mutated after fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    /// Provider identifier, the dedup key. Records without one are dropped.
    pub job_id: Option<String>,
    pub title: String,
    pub employer_name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub employment_type: Option<String>,
    pub description: Option<String>,
    pub apply_url: Option<String>,
    pub google_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl RawListing {
    /// "City, State, Country" with empty parts omitted.
    pub fn location(&self) -> String {
        [&self.city, &self.state, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parameters for one page request.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub query: &'a str,
    pub location: &'a str,
    pub page: u32,
    pub date_posted: DatePosted,
    pub sort_by: SortBy,
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("429 Too Many Requests")]
    RateLimited,

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Trait that every job search provider implements.
/// One call fetches exactly one page of results.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &str;

    async fn fetch_page(&self, request: &PageRequest<'_>)
    -> Result<Vec<RawListing>, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_skips_blank_parts() {
        let listing = RawListing {
            city: Some("Toronto".into()),
            state: Some(" ".into()),
            country: Some("CA".into()),
            ..Default::default()
        };
        assert_eq!(listing.location(), "Toronto, CA");
    }

    #[test]
    fn location_empty_when_unknown() {
        assert_eq!(RawListing::default().location(), "");
    }
}
