use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::AppError;
use crate::upstream::RawListing;

/// Approximate job identity across the provider and the user's own records:
/// case-folded, trimmed (title, company, location). Two distinct postings
/// with the same triple collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExclusionKey {
    title: String,
    company: String,
    location: String,
}

impl ExclusionKey {
    pub fn new(title: &str, company: &str, location: Option<&str>) -> Self {
        let fold = |s: &str| s.trim().to_lowercase();
        Self {
            title: fold(title),
            company: fold(company),
            location: fold(location.unwrap_or_default()),
        }
    }

    pub fn for_listing(listing: &RawListing) -> Self {
        Self::new(
            &listing.title,
            &listing.employer_name,
            Some(listing.location().as_str()),
        )
    }
}

/// Jobs a user has already saved or skipped.
#[derive(Debug, Default)]
pub struct Exclusions {
    pub saved: HashSet<ExclusionKey>,
    pub skipped: HashSet<ExclusionKey>,
}

impl Exclusions {
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.skipped.is_empty()
    }

    /// Drop listings present in either set. Returns the survivors in their
    /// original order and how many were removed.
    pub fn filter(&self, listings: Vec<RawListing>) -> (Vec<RawListing>, usize) {
        let before = listings.len();
        let kept: Vec<RawListing> = listings
            .into_iter()
            .filter(|listing| {
                let key = ExclusionKey::for_listing(listing);
                !self.saved.contains(&key) && !self.skipped.contains(&key)
            })
            .collect();
        let removed = before - kept.len();
        (kept, removed)
    }
}

/// Supplies a user's saved and skipped triples.
#[async_trait]
pub trait ExclusionSource: Send + Sync {
    async fn load(&self, user_id: i32) -> Result<Exclusions, AppError>;
}
