// ActorService: the scraper's only view of Apify.
//
// The orchestrator talks to this trait rather than ApifyClient so tests can
// script run lifecycles with MockActorService: no network, no sleeping.

use apify_client::{ApifyClient, FacebookCommentsInput, Result, RunData};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait ActorService: Send + Sync {
    /// Create a run of the comments actor. Returns immediately.
    async fn start_run(&self, token: &str, input: &FacebookCommentsInput) -> Result<RunData>;

    /// Read the current state of a run.
    async fn run_status(&self, token: &str, run_id: &str) -> Result<RunData>;

    /// Fetch every item of a finished run's dataset.
    async fn dataset_items(&self, token: &str, dataset_id: &str) -> Result<Vec<Value>>;
}

/// Apify-backed ActorService. Tokens arrive per request, so a client is
/// built per call on top of one shared connection pool.
pub struct ApifyActorService {
    http: reqwest::Client,
    base_url: String,
    actor_id: String,
}

impl ApifyActorService {
    pub fn new(base_url: impl Into<String>, actor_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            actor_id: actor_id.into(),
        }
    }

    fn client(&self, token: &str) -> ApifyClient {
        ApifyClient::new(token)
            .with_http_client(self.http.clone())
            .with_base_url(self.base_url.as_str())
    }
}

#[async_trait]
impl ActorService for ApifyActorService {
    async fn start_run(&self, token: &str, input: &FacebookCommentsInput) -> Result<RunData> {
        self.client(token).start_run(&self.actor_id, input).await
    }

    async fn run_status(&self, token: &str, run_id: &str) -> Result<RunData> {
        self.client(token).get_run(run_id).await
    }

    async fn dataset_items(&self, token: &str, dataset_id: &str) -> Result<Vec<Value>> {
        self.client(token).get_dataset_items(dataset_id).await
    }
}
