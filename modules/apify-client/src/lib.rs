pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{ApiResponse, FacebookCommentsInput, RunData, RunStatus};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use types::ErrorEnvelope;

pub const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

/// Actor ID for easyapi/facebook-post-comments-scraper.
pub const FACEBOOK_COMMENTS_SCRAPER: &str = "easyapi~facebook-post-comments-scraper";

#[derive(Clone)]
pub struct ApifyClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApifyClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
        }
    }

    /// Share a connection pool across clients built for different tokens.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Start an actor run. Returns immediately with run metadata.
    /// Apify answers `201 Created`; any other status is an error.
    pub async fn start_run<I: Serialize + ?Sized>(
        &self,
        actor_id: &str,
        input: &I,
    ) -> Result<RunData> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        if resp.status() != StatusCode::CREATED {
            return Err(api_error(resp).await);
        }

        let body = resp.text().await?;
        let api_resp: ApiResponse<RunData> = serde_json::from_str(&body)?;
        tracing::debug!(actor_id, run_id = %api_resp.data.id, "Apify run created");
        Ok(api_resp.data)
    }

    /// Read the current state of a run. Does not wait.
    pub async fn get_run(&self, run_id: &str) -> Result<RunData> {
        let url = format!("{}/actor-runs/{}", self.base_url, run_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let body = resp.text().await?;
        let api_resp: ApiResponse<RunData> = serde_json::from_str(&body)?;
        Ok(api_resp.data)
    }

    /// Fetch dataset items from a completed run.
    pub async fn get_dataset_items<T: DeserializeOwned>(&self, dataset_id: &str) -> Result<Vec<T>> {
        let url = format!(
            "{}/datasets/{}/items?format=json&clean=true",
            self.base_url, dataset_id
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let body = resp.text().await?;
        let items: Vec<T> = serde_json::from_str(&body)?;
        tracing::debug!(dataset_id, count = items.len(), "Fetched dataset items");
        Ok(items)
    }
}

async fn api_error(resp: reqwest::Response) -> ApifyError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    ApifyError::Api {
        status,
        message: error_message(&body),
    }
}

/// Prefer the message inside Apify's error envelope; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_reads_envelope() {
        let body = r#"{"error":{"type":"token-not-valid",
            "message":"Authentication token is not valid."}}"#;
        assert_eq!(error_message(body), "Authentication token is not valid.");
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApifyClient::new("t").with_base_url("http://localhost:1234/v2/");
        assert_eq!(client.base_url, "http://localhost:1234/v2");
    }
}
