use std::sync::Arc;

use apify_client::{ApifyError, FacebookCommentsInput};
use chrono::Utc;
use harvest_common::{
    normalize_items, HarvestError, PollPolicy, ScrapeJob, ScrapeRequest, ScrapeSummary,
};
use harvest_store::CommentStore;
use tracing::{debug, error, info};

use crate::poller::wait_for_run;
use crate::traits::ActorService;

/// Submit → poll → fetch → normalize → persist, one request at a time.
pub struct ScrapeOrchestrator {
    actors: Arc<dyn ActorService>,
    store: Arc<dyn CommentStore>,
    poll: PollPolicy,
    default_credential: Option<String>,
}

impl ScrapeOrchestrator {
    pub fn new(
        actors: Arc<dyn ActorService>,
        store: Arc<dyn CommentStore>,
        poll: PollPolicy,
    ) -> Self {
        Self {
            actors,
            store,
            poll,
            default_credential: None,
        }
    }

    /// Token used when a request does not carry its own.
    pub fn with_default_credential(mut self, token: Option<String>) -> Self {
        self.default_credential = token;
        self
    }

    pub async fn run_scrape(&self, request: ScrapeRequest) -> Result<ScrapeSummary, HarvestError> {
        let mut job = ScrapeJob::prepare(request, self.default_credential.as_deref())?;
        info!(urls = job.urls.len(), limit = ?job.limit, "Starting Facebook comments scrape");

        let input = FacebookCommentsInput {
            post_urls: job.urls.clone(),
            max_comments: job.limit,
        };
        let run = self
            .actors
            .start_run(&job.credential, &input)
            .await
            .map_err(|e| HarvestError::UpstreamSubmission {
                status: e.status(),
                message: upstream_message(e),
            })?;
        info!(run_id = %run.id, "Apify run started, polling for completion");
        job.run_id = Some(run.id.clone());

        let dataset_id =
            wait_for_run(self.actors.as_ref(), &job.credential, &run.id, &self.poll).await?;
        info!(run_id = %run.id, dataset_id = %dataset_id, "Run completed, fetching results");
        job.dataset_id = Some(dataset_id.clone());

        let items = self
            .actors
            .dataset_items(&job.credential, &dataset_id)
            .await
            .map_err(|e| HarvestError::UpstreamFetch {
                dataset_id: dataset_id.clone(),
                status: e.status(),
                message: upstream_message(e),
            })?;
        info!(count = items.len(), "Fetched dataset items");

        let records = normalize_items(items, &run.id, &dataset_id, Utc::now());
        if records.is_empty() {
            info!(run_id = %run.id, "Dataset is empty, nothing to store");
        } else if let Err(e) = self.store.insert_many(&records).await {
            error!(run_id = %run.id, error = %e, "Failed to store comment records");
            return Err(e.into());
        }

        debug!(?job, imported = records.len(), "Scrape finished");
        Ok(ScrapeSummary {
            run_id: run.id,
            dataset_id,
            imported: records.len(),
        })
    }
}

/// Upstream detail without the status prefix, which travels separately.
fn upstream_message(err: ApifyError) -> String {
    match err {
        ApifyError::Api { message, .. } => message,
        other => other.to_string(),
    }
}
