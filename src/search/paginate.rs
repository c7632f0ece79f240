use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::search::{DatePosted, SearchError, SortBy};
use crate::upstream::{JobSource, PageRequest, RawListing, UpstreamError};

/// Unique listings from one pagination run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchedListings {
    pub listings: Vec<RawListing>,
    /// The provider ran dry before the target was reached, so a larger
    /// target would not find more.
    pub exhausted: bool,
}

impl FetchedListings {
    pub fn new(listings: Vec<RawListing>, exhausted: bool) -> Self {
        Self {
            listings,
            exhausted,
        }
    }

    /// Whether these results answer a request for `target_count` listings.
    pub fn covers(&self, target_count: usize) -> bool {
        self.exhausted || self.listings.len() >= target_count
    }
}

/// Drives sequential page requests against a provider and deduplicates the
/// results by provider id.
pub struct Paginator {
    source: Arc<dyn JobSource>,
    max_pages: u32,
    page_timeout: Duration,
}

impl Paginator {
    pub fn new(source: Arc<dyn JobSource>, max_pages: u32, page_timeout: Duration) -> Self {
        Self {
            source,
            max_pages,
            page_timeout,
        }
    }

    /// Fetch up to `target_count` unique listings, first seen wins.
    ///
    /// Pagination stops at the target, at `max_pages`, on an empty page, or on
    /// the first failed page. A failure after anything was fetched yields the
    /// partial result; only a failure with nothing fetched is an error.
    /// Results short of the target are marked exhausted unless a page failed.
    pub async fn fetch_upstream(
        &self,
        query: &str,
        location: &str,
        target_count: usize,
        date_posted: DatePosted,
        sort_by: SortBy,
    ) -> Result<FetchedListings, SearchError> {
        let mut seen = HashSet::new();
        let mut listings = Vec::new();
        let mut dropped = 0usize;
        let mut pages_ok = 0u32;
        let mut failure: Option<(u32, UpstreamError)> = None;

        for page in 1..=self.max_pages {
            let request = PageRequest {
                query,
                location,
                page,
                date_posted,
                sort_by,
            };

            let batch = match self.fetch_page(&request).await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::warn!(
                        source = self.source.name(),
                        "Page {page} failed, stopping with {} listings: {e}",
                        listings.len()
                    );
                    failure = Some((page, e));
                    break;
                }
            };
            pages_ok += 1;

            if batch.is_empty() {
                tracing::debug!("Page {page} empty, results exhausted");
                break;
            }

            for record in batch {
                let Some(id) = record.job_id.clone() else {
                    dropped += 1;
                    continue;
                };
                if seen.insert(id) {
                    listings.push(record);
                }
            }

            if listings.len() >= target_count {
                break;
            }
        }

        let failed = failure.is_some();
        if listings.is_empty()
            && pages_ok == 0
            && let Some((page, source)) = failure
        {
            return Err(SearchError::UpstreamFailure { page, source });
        }

        let exhausted = !failed && listings.len() < target_count;
        listings.truncate(target_count);
        tracing::info!(
            source = self.source.name(),
            "Fetched {} unique listings from {pages_ok} pages ({dropped} without id dropped)",
            listings.len()
        );
        Ok(FetchedListings::new(listings, exhausted))
    }

    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<RawListing>, UpstreamError> {
        tokio::time::timeout(self.page_timeout, self.source.fetch_page(request))
            .await
            .unwrap_or(Err(UpstreamError::Timeout(self.page_timeout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::testing::{Page, ScriptedSource, listing, listings, unidentified};

    fn paginator(source: &Arc<ScriptedSource>, max_pages: u32) -> Paginator {
        Paginator::new(source.clone(), max_pages, Duration::from_secs(5))
    }

    async fn fetch_all(paginator: &Paginator, target: usize) -> Result<FetchedListings, SearchError> {
        paginator
            .fetch_upstream("rust", "", target, DatePosted::All, SortBy::Relevance)
            .await
    }

    async fn fetch(paginator: &Paginator, target: usize) -> Result<Vec<RawListing>, SearchError> {
        fetch_all(paginator, target).await.map(|fetched| fetched.listings)
    }

    fn ids(listings: &[RawListing]) -> Vec<&str> {
        listings.iter().filter_map(|l| l.job_id.as_deref()).collect()
    }

    #[tokio::test]
    async fn dedups_across_pages_keeping_first_seen_order() {
        let source = Arc::new(ScriptedSource::new(vec![
            Page::Ok(listings(&["a", "b", "c"])),
            Page::Ok(listings(&["b", "d", "a", "e"])),
            Page::Ok(listings(&["f", "d"])),
        ]));

        let result = fetch(&paginator(&source, 3), 100).await.unwrap();
        assert_eq!(ids(&result), ["a", "b", "c", "d", "e", "f"]);
        assert_eq!(source.requested_pages(), [1, 2, 3]);
    }

    #[tokio::test]
    async fn truncates_to_target_in_fetch_order() {
        let all: Vec<String> = (0..37).map(|i| format!("job-{i}")).collect();
        let page = |range: std::ops::Range<usize>| {
            Page::Ok(all[range].iter().map(|id| listing(id)).collect())
        };
        let source = Arc::new(ScriptedSource::new(vec![page(0..7), page(7..20), page(20..37)]));

        let result = fetch(&paginator(&source, 3), 10).await.unwrap();
        assert_eq!(result.len(), 10);
        assert_eq!(ids(&result), all[..10].iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(source.requested_pages(), [1, 2], "stops once the target is reached");
    }

    #[tokio::test]
    async fn partial_failure_returns_what_was_fetched() {
        let source = Arc::new(ScriptedSource::new(vec![
            Page::Ok(listings(&["1", "2", "3", "4", "5"])),
            Page::Fail,
            Page::Ok(listings(&["6"])),
        ]));

        let result = fetch(&paginator(&source, 3), 100).await.unwrap();
        assert_eq!(ids(&result), ["1", "2", "3", "4", "5"]);
        assert_eq!(source.requested_pages(), [1, 2]);
    }

    #[tokio::test]
    async fn total_failure_is_an_error() {
        let source = Arc::new(ScriptedSource::new(vec![Page::Fail]));

        let err = fetch(&paginator(&source, 3), 100).await.unwrap_err();
        assert!(matches!(err, SearchError::UpstreamFailure { page: 1, .. }));
    }

    #[tokio::test]
    async fn failure_after_an_empty_success_is_not_total() {
        let source = Arc::new(ScriptedSource::new(vec![
            Page::Ok(vec![unidentified("Mystery")]),
            Page::Fail,
        ]));

        let result = fetch(&paginator(&source, 3), 100).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn empty_page_ends_pagination() {
        let source = Arc::new(ScriptedSource::new(vec![
            Page::Ok(listings(&["a"])),
            Page::Ok(vec![]),
            Page::Ok(listings(&["b"])),
        ]));

        let result = fetch(&paginator(&source, 3), 100).await.unwrap();
        assert_eq!(ids(&result), ["a"]);
        assert_eq!(source.requested_pages(), [1, 2]);
    }

    #[tokio::test]
    async fn respects_max_pages() {
        let source = Arc::new(ScriptedSource::new(
            (0..10)
                .map(|p| Page::Ok(listings(&[format!("p{p}").as_str()])))
                .collect(),
        ));

        let result = fetch(&paginator(&source, 3), 100).await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(source.requested_pages(), [1, 2, 3]);
    }

    #[tokio::test]
    async fn records_without_id_do_not_count_toward_target() {
        let source = Arc::new(ScriptedSource::new(vec![
            Page::Ok(vec![unidentified("x"), listing("a"), unidentified("y")]),
            Page::Ok(listings(&["b", "c"])),
        ]));

        let result = fetch(&paginator(&source, 3), 2).await.unwrap();
        assert_eq!(ids(&result), ["a", "b"]);
        assert_eq!(source.requested_pages(), [1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_page_counts_as_failure() {
        let source = Arc::new(ScriptedSource::new(vec![
            Page::Ok(listings(&["a", "b"])),
            Page::Hang,
        ]));
        let paginator = Paginator::new(source.clone(), 3, Duration::from_secs(2));

        let result = fetch(&paginator, 100).await.unwrap();
        assert_eq!(ids(&result), ["a", "b"]);
    }

    #[tokio::test]
    async fn running_dry_marks_results_exhausted() {
        let source = Arc::new(ScriptedSource::new(vec![Page::Ok(listings(&["a", "b"]))]));

        let fetched = fetch_all(&paginator(&source, 3), 10).await.unwrap();
        assert!(fetched.exhausted);
        assert!(fetched.covers(100));
    }

    #[tokio::test]
    async fn reaching_the_target_is_not_exhaustion() {
        let source = Arc::new(ScriptedSource::new(vec![Page::Ok(listings(&[
            "a", "b", "c", "d",
        ]))]));

        let fetched = fetch_all(&paginator(&source, 3), 2).await.unwrap();
        assert_eq!(fetched.listings.len(), 2);
        assert!(!fetched.exhausted);
        assert!(fetched.covers(2));
        assert!(!fetched.covers(3));
    }

    #[tokio::test]
    async fn partial_failure_is_not_exhaustion() {
        let source = Arc::new(ScriptedSource::new(vec![
            Page::Ok(listings(&["a"])),
            Page::Fail,
        ]));

        let fetched = fetch_all(&paginator(&source, 3), 10).await.unwrap();
        assert_eq!(fetched.listings.len(), 1);
        assert!(!fetched.exhausted);
    }
}
