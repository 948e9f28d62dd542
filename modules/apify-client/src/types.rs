use std::fmt;

use serde::{Deserialize, Serialize};

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Error envelope Apify returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

/// Input for the easyapi/facebook-post-comments-scraper actor.
#[derive(Debug, Clone, Serialize)]
pub struct FacebookCommentsInput {
    #[serde(rename = "postUrls")]
    pub post_urls: Vec<String>,
    #[serde(rename = "maxComments", skip_serializing_if = "Option::is_none")]
    pub max_comments: Option<u32>,
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: Option<String>,
}

impl RunData {
    pub fn run_status(&self) -> RunStatus {
        RunStatus::parse(&self.status)
    }
}

/// Lifecycle status of an actor run as reported by Apify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
    Aborting,
    Aborted,
    TimingOut,
    TimedOut,
    /// A status this client does not know about. Treated as still in progress.
    Other(String),
}

impl RunStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "READY" => RunStatus::Ready,
            "RUNNING" => RunStatus::Running,
            "SUCCEEDED" => RunStatus::Succeeded,
            "FAILED" => RunStatus::Failed,
            "ABORTING" => RunStatus::Aborting,
            "ABORTED" => RunStatus::Aborted,
            "TIMING-OUT" => RunStatus::TimingOut,
            "TIMED-OUT" => RunStatus::TimedOut,
            _ => RunStatus::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Ready => "READY",
            RunStatus::Running => "RUNNING",
            RunStatus::Succeeded => "SUCCEEDED",
            RunStatus::Failed => "FAILED",
            RunStatus::Aborting => "ABORTING",
            RunStatus::Aborted => "ABORTED",
            RunStatus::TimingOut => "TIMING-OUT",
            RunStatus::TimedOut => "TIMED-OUT",
            RunStatus::Other(raw) => raw,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RunStatus::Failed | RunStatus::Aborted | RunStatus::TimedOut
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_statuses() {
        assert_eq!(RunStatus::parse("SUCCEEDED"), RunStatus::Succeeded);
        assert_eq!(RunStatus::parse("TIMED-OUT"), RunStatus::TimedOut);
        assert_eq!(RunStatus::parse("running"), RunStatus::Running);
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let status = RunStatus::parse("PAUSED");
        assert_eq!(status, RunStatus::Other("PAUSED".to_string()));
        assert!(!status.is_failure());
        assert_eq!(status.as_str(), "PAUSED");
    }

    #[test]
    fn failure_statuses() {
        for raw in ["FAILED", "ABORTED", "TIMED-OUT"] {
            assert!(RunStatus::parse(raw).is_failure(), "{raw} should be a failure");
        }
        assert!(!RunStatus::Succeeded.is_failure());
        assert!(!RunStatus::Aborting.is_failure());
        assert!(!RunStatus::TimingOut.is_failure());
    }

    #[test]
    fn comments_input_omits_missing_limit() {
        let input = FacebookCommentsInput {
            post_urls: vec!["https://facebook.com/post/1".to_string()],
            max_comments: None,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json, serde_json::json!({"postUrls": ["https://facebook.com/post/1"]}));
    }

    #[test]
    fn run_data_tolerates_missing_dataset() {
        let run: RunData =
            serde_json::from_str(r#"{"id":"r1","status":"READY","startedAt":null}"#).unwrap();
        assert_eq!(run.run_status(), RunStatus::Ready);
        assert!(run.default_dataset_id.is_none());
    }
}
