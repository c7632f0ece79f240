// Cached, deduplicating job search in front of the upstream provider.

pub mod cache;
pub mod exclusion;
pub mod key;
pub mod paginate;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::search::cache::CacheStore;
use crate::search::exclusion::ExclusionSource;
use crate::search::key::CacheKey;
use crate::search::paginate::Paginator;
use crate::upstream::{RawListing, UpstreamError};

/// Recency filter, spelled the way the provider expects it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DatePosted {
    #[default]
    All,
    Today,
    #[serde(rename = "3days")]
    #[value(name = "3days")]
    ThreeDays,
    Week,
    Month,
}

impl DatePosted {
    pub fn as_str(self) -> &'static str {
        match self {
            DatePosted::All => "all",
            DatePosted::Today => "today",
            DatePosted::ThreeDays => "3days",
            DatePosted::Week => "week",
            DatePosted::Month => "month",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Relevance,
    Date,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::Date => "date",
        }
    }
}

/// One search request. Location is usually empty because users type it into
/// the query ("rust developer in Berlin").
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub location: String,
    pub date_posted: DatePosted,
    pub sort_by: SortBy,
    pub target_count: usize,
    pub force_refresh: bool,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, target_count: usize) -> Self {
        Self {
            query: query.into(),
            location: String::new(),
            date_posted: DatePosted::default(),
            sort_by: SortBy::default(),
            target_count,
            force_refresh: false,
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::normalize(&self.query, &self.location, self.date_posted, self.sort_by)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Nothing was fetched and the upstream failed.
    #[error("job search failed on page {page}: {source}")]
    UpstreamFailure { page: u32, source: UpstreamError },
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub listings: Vec<RawListing>,
    pub message: String,
    /// Listings hidden because the user saved or skipped them.
    pub excluded: usize,
    pub cached: bool,
}

/// Single entry point for job searches: cache, then upstream, then per-user
/// exclusions.
pub struct JobSearch {
    paginator: Paginator,
    cache: CacheStore,
    exclusions: Arc<dyn ExclusionSource>,
}

impl JobSearch {
    pub fn new(
        paginator: Paginator,
        cache: CacheStore,
        exclusions: Arc<dyn ExclusionSource>,
    ) -> Self {
        Self {
            paginator,
            cache,
            exclusions,
        }
    }

    pub async fn search(
        &self,
        query: &SearchQuery,
        user_id: Option<i32>,
    ) -> Result<SearchOutcome, SearchError> {
        let key = query.cache_key();

        let cached = if query.force_refresh {
            None
        } else {
            self.cache.get(&key).await.filter(|hit| {
                let covers = hit.covers(query.target_count);
                if !covers {
                    tracing::debug!(
                        "Cached results for '{}' hold {} of {} requested, refetching",
                        query.query,
                        hit.listings.len(),
                        query.target_count
                    );
                }
                covers
            })
        };
        let from_cache = cached.is_some();

        let mut listings = match cached {
            Some(hit) => {
                tracing::debug!(
                    backend = self.cache.backend_name(),
                    "Cache hit for '{}'",
                    query.query
                );
                hit.listings
            }
            None => {
                let fetched = self
                    .paginator
                    .fetch_upstream(
                        &query.query,
                        &query.location,
                        query.target_count,
                        query.date_posted,
                        query.sort_by,
                    )
                    .await?;
                self.cache.set(&key, &fetched).await;
                fetched.listings
            }
        };

        let mut excluded = 0;
        if let Some(user_id) = user_id {
            match self.exclusions.load(user_id).await {
                Ok(exclusions) if !exclusions.is_empty() => {
                    let (kept, removed) = exclusions.filter(listings);
                    listings = kept;
                    excluded = removed;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        "Could not load exclusions for user {user_id}, returning unfiltered results: {e}"
                    );
                }
            }
        }

        listings.truncate(query.target_count);

        Ok(SearchOutcome {
            message: summarize(listings.len(), excluded),
            listings,
            excluded,
            cached: from_cache,
        })
    }
}

fn summarize(found: usize, excluded: usize) -> String {
    match (found, excluded) {
        (0, 0) => "No jobs found".to_string(),
        (0, excluded) => format!("No new jobs found ({excluded} already saved/skipped)"),
        (found, 0) => format!("Found {found} jobs"),
        (found, excluded) => format!("Found {found} jobs ({excluded} already saved/skipped)"),
    }
}
