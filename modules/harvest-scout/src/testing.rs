// Test doubles for the scrape pipeline.
//
// MockActorService scripts an Apify run: a queue of statuses handed out one
// per poll (the last one repeats), a fixed dataset, and optional failures at
// each step. It records every call so tests can assert on call counts,
// tokens and poll spacing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use apify_client::{ApifyError, FacebookCommentsInput, Result, RunData};
use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use crate::traits::ActorService;

/// RunData with only the fields the pipeline reads.
pub fn run_data(id: &str, status: &str, dataset: Option<&str>) -> RunData {
    RunData {
        id: id.to_string(),
        status: status.to_string(),
        default_dataset_id: dataset.map(str::to_string),
    }
}

// ---------------------------------------------------------------------------
// MockActorService
// ---------------------------------------------------------------------------

pub struct MockActorService {
    run_id: String,
    dataset_id: String,
    statuses: Mutex<VecDeque<String>>,
    items: Vec<Value>,
    start_error: Option<(u16, String)>,
    status_error: Option<(u16, String)>,
    dataset_error: Option<(u16, String)>,
    status_delay: Option<Duration>,

    start_calls: AtomicUsize,
    status_calls: AtomicUsize,
    dataset_calls: AtomicUsize,
    inputs: Mutex<Vec<FacebookCommentsInput>>,
    tokens: Mutex<Vec<String>>,
    poll_instants: Mutex<Vec<Instant>>,
}

impl MockActorService {
    /// A run that succeeds on the first poll with an empty dataset.
    pub fn new() -> Self {
        Self {
            run_id: "run-1".to_string(),
            dataset_id: "dataset-1".to_string(),
            statuses: Mutex::new(VecDeque::from(["SUCCEEDED".to_string()])),
            items: Vec::new(),
            start_error: None,
            status_error: None,
            dataset_error: None,
            status_delay: None,
            start_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            dataset_calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
            poll_instants: Mutex::new(Vec::new()),
        }
    }

    pub fn with_ids(mut self, run_id: &str, dataset_id: &str) -> Self {
        self.run_id = run_id.to_string();
        self.dataset_id = dataset_id.to_string();
        self
    }

    /// Statuses returned by successive polls. The last one repeats forever.
    pub fn with_statuses(self, statuses: &[&str]) -> Self {
        *self.statuses.lock().unwrap() = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_items(mut self, items: Vec<Value>) -> Self {
        self.items = items;
        self
    }

    pub fn failing_start(mut self, status: u16, message: &str) -> Self {
        self.start_error = Some((status, message.to_string()));
        self
    }

    pub fn failing_status(mut self, status: u16, message: &str) -> Self {
        self.status_error = Some((status, message.to_string()));
        self
    }

    pub fn failing_dataset(mut self, status: u16, message: &str) -> Self {
        self.dataset_error = Some((status, message.to_string()));
        self
    }

    /// Each status check takes this long (tokio clock) before answering.
    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn dataset_calls(&self) -> usize {
        self.dataset_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.start_calls() + self.status_calls() + self.dataset_calls()
    }

    pub fn inputs(&self) -> Vec<FacebookCommentsInput> {
        self.inputs.lock().unwrap().clone()
    }

    /// Every token seen, in call order.
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    /// When each status poll happened (tokio clock, so paused time works).
    pub fn poll_instants(&self) -> Vec<Instant> {
        self.poll_instants.lock().unwrap().clone()
    }

    fn record_token(&self, token: &str) {
        self.tokens.lock().unwrap().push(token.to_string());
    }

    fn next_status(&self) -> String {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap_or_default()
        } else {
            statuses.front().cloned().unwrap_or_else(|| "RUNNING".to_string())
        }
    }
}

impl Default for MockActorService {
    fn default() -> Self {
        Self::new()
    }
}

fn api_error((status, message): &(u16, String)) -> ApifyError {
    ApifyError::Api {
        status: *status,
        message: message.clone(),
    }
}

#[async_trait]
impl ActorService for MockActorService {
    async fn start_run(&self, token: &str, input: &FacebookCommentsInput) -> Result<RunData> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.record_token(token);
        self.inputs.lock().unwrap().push(input.clone());
        if let Some(err) = &self.start_error {
            return Err(api_error(err));
        }
        Ok(run_data(&self.run_id, "READY", None))
    }

    async fn run_status(&self, token: &str, run_id: &str) -> Result<RunData> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.record_token(token);
        self.poll_instants.lock().unwrap().push(Instant::now());
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.status_error {
            return Err(api_error(err));
        }
        let status = self.next_status();
        let dataset = (status == "SUCCEEDED").then_some(self.dataset_id.as_str());
        Ok(run_data(run_id, &status, dataset))
    }

    async fn dataset_items(&self, token: &str, dataset_id: &str) -> Result<Vec<Value>> {
        self.dataset_calls.fetch_add(1, Ordering::SeqCst);
        self.record_token(token);
        if let Some(err) = &self.dataset_error {
            return Err(api_error(err));
        }
        if dataset_id != self.dataset_id {
            return Err(ApifyError::Api {
                status: 404,
                message: format!("dataset {dataset_id} not found"),
            });
        }
        Ok(self.items.clone())
    }
}
