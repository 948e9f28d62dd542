use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to start Apify run{}: {message}", status_suffix(.status))]
    UpstreamSubmission { status: Option<u16>, message: String },

    #[error("Failed to read status of Apify run {run_id}{}: {message}", status_suffix(.status))]
    UpstreamPoll {
        run_id: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Apify run {run_id} ended with status {status}")]
    UpstreamRunFailed { run_id: String, status: String },

    #[error("Apify run {run_id} not finished after {attempts} status checks ({waited_secs}s)")]
    UpstreamTimeout {
        run_id: String,
        attempts: u32,
        waited_secs: u64,
    },

    #[error("Failed to fetch dataset {dataset_id}{}: {message}", status_suffix(.status))]
    UpstreamFetch {
        dataset_id: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl HarvestError {
    /// Stable machine-readable name, used in API error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            HarvestError::Configuration(_) => "configuration",
            HarvestError::UpstreamSubmission { .. } => "upstream_submission",
            HarvestError::UpstreamPoll { .. } => "upstream_poll",
            HarvestError::UpstreamRunFailed { .. } => "upstream_run_failed",
            HarvestError::UpstreamTimeout { .. } => "upstream_timeout",
            HarvestError::UpstreamFetch { .. } => "upstream_fetch",
            HarvestError::Storage(_) => "storage",
        }
    }

    /// HTTP status Apify answered with, when the failure came from a response.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            HarvestError::UpstreamSubmission { status, .. }
            | HarvestError::UpstreamPoll { status, .. }
            | HarvestError::UpstreamFetch { status, .. } => *status,
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}
