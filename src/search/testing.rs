// Fakes shared by the search tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;
use crate::search::cache::{CacheBackend, CacheError};
use crate::search::exclusion::{ExclusionKey, ExclusionSource, Exclusions};
use crate::search::key::CacheKey;
use crate::search::paginate::FetchedListings;
use crate::upstream::{JobSource, PageRequest, RawListing, UpstreamError};

pub fn listing(id: &str) -> RawListing {
    job(id, &format!("Job {id}"), "Acme", "Remote")
}

pub fn listings(ids: &[&str]) -> Vec<RawListing> {
    ids.iter().map(|id| listing(id)).collect()
}

pub fn job(id: &str, title: &str, company: &str, city: &str) -> RawListing {
    RawListing {
        job_id: Some(id.to_string()),
        title: title.to_string(),
        employer_name: company.to_string(),
        city: Some(city.to_string()),
        ..Default::default()
    }
}

pub fn unidentified(title: &str) -> RawListing {
    RawListing {
        title: title.to_string(),
        ..Default::default()
    }
}

pub enum Page {
    Ok(Vec<RawListing>),
    Fail,
    Hang,
}

/// Serves a fixed script of pages; pages past the script are empty.
pub struct ScriptedSource {
    pages: Vec<Page>,
    requested: Mutex<Vec<u32>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            requested: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<RawListing>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(request.page);

        match self.pages.get(request.page as usize - 1) {
            Some(Page::Ok(batch)) => Ok(batch.clone()),
            Some(Page::Fail) => Err(UpstreamError::Status(503)),
            Some(Page::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }
}

/// A cache backend that is always down.
pub struct FailingCache;

#[async_trait]
impl CacheBackend for FailingCache {
    fn name(&self) -> &str {
        "failing"
    }

    async fn load(&self, _key: &CacheKey) -> Result<Option<FetchedListings>, CacheError> {
        Err(CacheError::Timeout(Duration::from_millis(500)))
    }

    async fn store(&self, _key: &CacheKey, _results: &FetchedListings) -> Result<(), CacheError> {
        Err(CacheError::Timeout(Duration::from_millis(500)))
    }
}

/// Fixed saved/skipped triples for every user.
#[derive(Default)]
pub struct StaticExclusions {
    pub saved: Vec<(String, String, String)>,
    pub skipped: Vec<(String, String, String)>,
    pub fail: bool,
}

impl StaticExclusions {
    pub fn saved(title: &str, company: &str, location: &str) -> Self {
        Self {
            saved: vec![(title.into(), company.into(), location.into())],
            ..Default::default()
        }
    }
}

fn keys(triples: &[(String, String, String)]) -> HashSet<ExclusionKey> {
    triples
        .iter()
        .map(|(t, c, l)| ExclusionKey::new(t, c, Some(l.as_str())))
        .collect()
}

#[async_trait]
impl ExclusionSource for StaticExclusions {
    async fn load(&self, _user_id: i32) -> Result<Exclusions, AppError> {
        if self.fail {
            return Err(AppError::Internal("exclusions unavailable".to_string()));
        }
        Ok(Exclusions {
            saved: keys(&self.saved),
            skipped: keys(&self.skipped),
        })
    }
}
