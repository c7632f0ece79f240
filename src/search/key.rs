use crate::search::{DatePosted, SortBy};

const STORAGE_PREFIX: &str = "jobsearch:";

/// Normalized identity of a search. Target count and force-refresh are not part
/// of it, so a cached result serves any request for the same search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    location: String,
    date_posted: DatePosted,
    sort_by: SortBy,
}

impl CacheKey {
    pub fn normalize(
        query: &str,
        location: &str,
        date_posted: DatePosted,
        sort_by: SortBy,
    ) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            location: location.trim().to_lowercase(),
            date_posted,
            sort_by,
        }
    }

    /// String form for external stores. JSON escaping keeps it unambiguous
    /// whatever the query text contains.
    pub fn storage_key(&self) -> String {
        let fields = (
            &self.query,
            &self.location,
            self.date_posted.as_str(),
            self.sort_by.as_str(),
        );
        // Serializing a tuple of strings cannot fail.
        let encoded = serde_json::to_string(&fields).unwrap_or_default();
        format!("{STORAGE_PREFIX}{encoded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing_and_whitespace_do_not_matter() {
        let a = CacheKey::normalize(" Python Dev ", "NYC", DatePosted::Week, SortBy::Date);
        let b = CacheKey::normalize("python dev", "nyc", DatePosted::Week, SortBy::Date);
        assert_eq!(a, b);
        assert_eq!(a.storage_key(), b.storage_key());
    }

    #[test]
    fn filters_are_part_of_the_key() {
        let week = CacheKey::normalize("rust", "", DatePosted::Week, SortBy::Relevance);
        let month = CacheKey::normalize("rust", "", DatePosted::Month, SortBy::Relevance);
        let by_date = CacheKey::normalize("rust", "", DatePosted::Week, SortBy::Date);
        assert_ne!(week, month);
        assert_ne!(week, by_date);
    }

    #[test]
    fn empty_location_is_an_explicit_field() {
        let key = CacheKey::normalize("rust in berlin", "  ", DatePosted::All, SortBy::Relevance);
        assert_eq!(
            key.storage_key(),
            r#"jobsearch:["rust in berlin","","all","relevance"]"#
        );
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        let a = CacheKey::normalize("a\",\"b", "", DatePosted::All, SortBy::Relevance);
        let b = CacheKey::normalize("a", "b", DatePosted::All, SortBy::Relevance);
        assert_ne!(a.storage_key(), b.storage_key());
    }
}
