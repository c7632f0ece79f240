use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::search::SortBy;
use crate::upstream::{JobSource, PageRequest, RawListing, UpstreamError};

pub const DEFAULT_BASE_URL: &str = "https://jsearch.p.rapidapi.com";
pub const DEFAULT_HOST: &str = "jsearch.p.rapidapi.com";

/// JSearch (RapidAPI) client. Requests one provider page per call.
pub struct JSearch {
    client: reqwest::Client,
    base_url: String,
    host: String,
    api_key: String,
    timeout: Duration,
}

impl JSearch {
    pub fn new(
        base_url: &str,
        host: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("jobhunt/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            host: host.to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    fn query_params(request: &PageRequest<'_>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", request.query.to_string()),
            ("page", request.page.to_string()),
            ("num_pages", "1".to_string()),
            ("date_posted", request.date_posted.as_str().to_string()),
        ];
        if !request.location.is_empty() {
            params.push(("location", request.location.to_string()));
        }
        if request.sort_by == SortBy::Date {
            params.push(("sort_by", "date".to_string()));
        }
        params
    }
}

#[async_trait]
impl JobSource for JSearch {
    fn name(&self) -> &str {
        "jsearch"
    }

    async fn fetch_page(
        &self,
        request: &PageRequest<'_>,
    ) -> Result<Vec<RawListing>, UpstreamError> {
        let url = format!("{}/search", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&Self::query_params(request))
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.host)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if resp.status().as_u16() == 429 {
            return Err(UpstreamError::RateLimited);
        }

        if !resp.status().is_success() {
            return Err(UpstreamError::Status(resp.status().as_u16()));
        }

        let data: Value = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout(self.timeout)
            } else {
                UpstreamError::Decode(e.to_string())
            }
        })?;

        Ok(parse_results(&data))
    }
}

impl JSearch {
    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::Request(err)
        }
    }
}

/// Parse a search response body. A body without a `data` array is an empty page.
fn parse_results(data: &Value) -> Vec<RawListing> {
    data.get("data")
        .and_then(|v| v.as_array())
        .map(|results| results.iter().map(parse_api_job).collect())
        .unwrap_or_default()
}

/// Parse a single job. Missing fields become empty; a missing `job_id` is kept
/// as `None` so the paginator can count and drop it.
fn parse_api_job(raw: &Value) -> RawListing {
    let text = |key: &str| {
        raw.get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    RawListing {
        job_id: text("job_id"),
        title: text("job_title").unwrap_or_default(),
        employer_name: text("employer_name").unwrap_or_default(),
        city: text("job_city"),
        state: text("job_state"),
        country: text("job_country"),
        salary_min: salary(raw, "job_min_salary"),
        salary_max: salary(raw, "job_max_salary"),
        employment_type: text("job_employment_type"),
        description: text("job_description"),
        apply_url: text("job_apply_link"),
        google_url: text("job_google_link"),
        posted_at: posted_at(raw),
    }
}

fn salary(raw: &Value, key: &str) -> Option<i64> {
    raw.get(key).and_then(|v| v.as_f64()).map(|v| v as i64)
}

/// Prefer the unix timestamp, fall back to the ISO string.
fn posted_at(raw: &Value) -> Option<DateTime<Utc>> {
    raw.get("job_posted_at_timestamp")
        .and_then(|v| v.as_i64())
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .or_else(|| {
            raw.get("job_posted_at_datetime_utc")
                .and_then(|v| v.as_str())
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::DatePosted;
    use serde_json::json;

    #[test]
    fn parses_provider_fields() {
        let body = json!({
            "status": "OK",
            "data": [{
                "job_id": "abc123",
                "job_title": "Rust Engineer",
                "employer_name": "Acme",
                "job_city": "Toronto",
                "job_state": "ON",
                "job_country": "CA",
                "job_min_salary": 120000.0,
                "job_max_salary": 150000,
                "job_employment_type": "FULLTIME",
                "job_description": "Build things",
                "job_apply_link": "https://acme.example/apply",
                "job_posted_at_timestamp": 1_700_000_000
            }]
        });

        let jobs = parse_results(&body);
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.job_id.as_deref(), Some("abc123"));
        assert_eq!(job.title, "Rust Engineer");
        assert_eq!(job.location(), "Toronto, ON, CA");
        assert_eq!(job.salary_min, Some(120_000));
        assert_eq!(job.salary_max, Some(150_000));
        assert_eq!(
            job.posted_at,
            DateTime::from_timestamp(1_700_000_000, 0)
        );
    }

    #[test]
    fn keeps_records_without_id_for_the_paginator() {
        let body = json!({ "data": [{ "job_title": "Mystery" }, { "job_id": "", "job_title": "Blank" }] });
        let jobs = parse_results(&body);
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.job_id.is_none()));
    }

    #[test]
    fn missing_data_is_an_empty_page() {
        assert!(parse_results(&json!({ "status": "OK" })).is_empty());
        assert!(parse_results(&json!({ "data": [] })).is_empty());
    }

    #[test]
    fn falls_back_to_iso_posting_date() {
        let raw = json!({ "job_posted_at_datetime_utc": "2024-05-01T12:00:00.000Z" });
        let posted = posted_at(&raw).map(|dt| dt.to_rfc3339());
        assert_eq!(posted.as_deref(), Some("2024-05-01T12:00:00+00:00"));
    }

    #[test]
    fn builds_provider_query() {
        let request = PageRequest {
            query: "python developer in Canada",
            location: "",
            page: 2,
            date_posted: DatePosted::Week,
            sort_by: SortBy::Date,
        };
        let params = JSearch::query_params(&request);
        assert!(params.contains(&("page", "2".to_string())));
        assert!(params.contains(&("date_posted", "week".to_string())));
        assert!(params.contains(&("sort_by", "date".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "location"));
    }
}
