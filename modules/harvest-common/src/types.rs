use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HarvestError;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

// --- Persisted records ---

/// One normalized comment scraped from a Facebook post.
/// Never updated after insert; `raw` keeps the upstream item verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: Uuid,
    pub run_id: String,
    pub dataset_id: String,
    pub fetched_at: DateTime<Utc>,
    pub author_name: Option<String>,
    pub author_id: Option<String>,
    pub comment_id: Option<String>,
    pub comment_text: Option<String>,
    pub reaction_count: i64,
    pub post_url: Option<String>,
    pub parent_id: Option<String>,
    pub post_title: Option<String>,
    pub raw: serde_json::Value,
}

// --- Scrape requests ---

/// Caller input for a scrape, before validation.
#[derive(Debug, Clone, Default)]
pub struct ScrapeRequest {
    pub urls: Vec<String>,
    pub limit: Option<i64>,
    pub credential: Option<String>,
}

/// A validated scrape. Lives for the duration of one request only.
#[derive(Clone)]
pub struct ScrapeJob {
    pub urls: Vec<String>,
    pub limit: Option<u32>,
    pub credential: String,
    pub run_id: Option<String>,
    pub dataset_id: Option<String>,
}

impl ScrapeJob {
    /// Validate a request and resolve its credential, falling back to the
    /// process-wide default. Blank strings count as absent.
    pub fn prepare(
        request: ScrapeRequest,
        default_credential: Option<&str>,
    ) -> Result<Self, HarvestError> {
        let urls: Vec<String> = request
            .urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect();
        if urls.is_empty() {
            return Err(HarvestError::Configuration(
                "at least one Facebook post URL is required".into(),
            ));
        }

        let limit = match request.limit {
            None => None,
            Some(n) if n >= 1 => Some(u32::try_from(n).map_err(|_| {
                HarvestError::Configuration(format!("limit {n} is too large"))
            })?),
            Some(n) => {
                return Err(HarvestError::Configuration(format!(
                    "limit must be a positive integer, got {n}"
                )))
            }
        };

        let credential = non_blank(request.credential.as_deref())
            .or_else(|| non_blank(default_credential))
            .ok_or_else(|| {
                HarvestError::Configuration(
                    "missing Apify token: pass apifyToken in the request or set DEFAULT_APIFY_TOKEN"
                        .into(),
                )
            })?;

        Ok(Self {
            urls,
            limit,
            credential,
            run_id: None,
            dataset_id: None,
        })
    }
}

impl fmt::Debug for ScrapeJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeJob")
            .field("urls", &self.urls)
            .field("limit", &self.limit)
            .field("credential", &"<redacted>")
            .field("run_id", &self.run_id)
            .field("dataset_id", &self.dataset_id)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Result of a completed scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeSummary {
    pub run_id: String,
    pub dataset_id: String,
    pub imported: usize,
}

// --- Pagination ---

/// Zero-based page of stored comments, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u32,
}

impl PageRequest {
    /// Clamp raw query values: page to >= 0, page size to 1..=100 (default 50).
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.unwrap_or(0).max(0) as u64;
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE as i64)
            .clamp(1, MAX_PAGE_SIZE as i64) as u32;
        Self { page, page_size }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.page_size as u64)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(urls: &[&str], limit: Option<i64>, credential: Option<&str>) -> ScrapeRequest {
        ScrapeRequest {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            limit,
            credential: credential.map(str::to_string),
        }
    }

    #[test]
    fn prepare_prefers_request_credential() {
        let job = ScrapeJob::prepare(
            request(&["https://facebook.com/post/1"], Some(10), Some("from-request")),
            Some("default"),
        )
        .unwrap();
        assert_eq!(job.credential, "from-request");
        assert_eq!(job.limit, Some(10));
    }

    #[test]
    fn prepare_falls_back_to_default_credential() {
        let job = ScrapeJob::prepare(
            request(&["https://facebook.com/post/1"], None, Some("   ")),
            Some("default"),
        )
        .unwrap();
        assert_eq!(job.credential, "default");
        assert_eq!(job.limit, None);
    }

    #[test]
    fn prepare_without_any_credential_is_configuration_error() {
        let err = ScrapeJob::prepare(request(&["https://facebook.com/post/1"], None, None), None)
            .unwrap_err();
        assert!(matches!(err, HarvestError::Configuration(_)));
    }

    #[test]
    fn prepare_drops_blank_urls() {
        let job = ScrapeJob::prepare(
            request(&["  ", " https://facebook.com/post/2 "], None, Some("t")),
            None,
        )
        .unwrap();
        assert_eq!(job.urls, vec!["https://facebook.com/post/2".to_string()]);

        let err = ScrapeJob::prepare(request(&["", " "], None, Some("t")), None).unwrap_err();
        assert!(matches!(err, HarvestError::Configuration(_)));
    }

    #[test]
    fn prepare_rejects_non_positive_limit() {
        for limit in [0, -5] {
            let err = ScrapeJob::prepare(
                request(&["https://facebook.com/post/1"], Some(limit), Some("t")),
                None,
            )
            .unwrap_err();
            assert!(matches!(err, HarvestError::Configuration(_)));
        }
    }

    #[test]
    fn job_debug_redacts_credential() {
        let job = ScrapeJob::prepare(
            request(&["https://facebook.com/post/1"], None, Some("secret-token")),
            None,
        )
        .unwrap();
        let printed = format!("{job:?}");
        assert!(!printed.contains("secret-token"));
    }

    #[test]
    fn page_request_defaults_and_clamps() {
        assert_eq!(PageRequest::default(), PageRequest { page: 0, page_size: 50 });
        assert_eq!(PageRequest::new(Some(-3), Some(500)), PageRequest { page: 0, page_size: 100 });
        assert_eq!(PageRequest::new(Some(2), Some(0)), PageRequest { page: 2, page_size: 1 });
        assert_eq!(PageRequest::new(Some(3), Some(20)).offset(), 60);
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = ScrapeSummary {
            run_id: "run-1".into(),
            dataset_id: "ds-1".into(),
            imported: 3,
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({"runId": "run-1", "datasetId": "ds-1", "imported": 3})
        );
    }
}
