// Run lifecycle: poll an Apify run at a fixed interval until it reaches a
// terminal status or the poll policy runs out.

use apify_client::{RunData, RunStatus};
use harvest_common::{HarvestError, PollPolicy};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::traits::ActorService;

/// Where a run stands from our side.
///
/// `Submitted -> Running* -> Done | FailedTerminal`, plus `TimedOutLocally`
/// when the poll policy is exhausted first. Terminal phases never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    Submitted,
    Running,
    Done { dataset_id: Option<String> },
    FailedTerminal { status: String },
    TimedOutLocally,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunPhase::Done { .. } | RunPhase::FailedTerminal { .. } | RunPhase::TimedOutLocally
        )
    }

    /// Apply one observed run state.
    pub fn observe(self, run: &RunData) -> RunPhase {
        if self.is_terminal() {
            return self;
        }
        let status = run.run_status();
        match status {
            RunStatus::Succeeded => RunPhase::Done {
                dataset_id: run.default_dataset_id.clone(),
            },
            s if s.is_failure() => RunPhase::FailedTerminal {
                status: s.as_str().to_string(),
            },
            _ => RunPhase::Running,
        }
    }

    /// Local give-up. Only reachable from a non-terminal phase.
    pub fn time_out(self) -> RunPhase {
        if self.is_terminal() {
            self
        } else {
            RunPhase::TimedOutLocally
        }
    }
}

/// Poll until the run finishes. Returns the run's dataset id.
///
/// The first status check happens immediately; each later one waits
/// `policy.interval`. Gives up after `policy.max_attempts` checks, or before
/// a sleep that would overrun `policy.max_wait`.
pub async fn wait_for_run(
    actors: &dyn ActorService,
    token: &str,
    run_id: &str,
    policy: &PollPolicy,
) -> Result<String, HarvestError> {
    let started = Instant::now();
    let mut phase = RunPhase::Submitted;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let run = actors
            .run_status(token, run_id)
            .await
            .map_err(|e| HarvestError::UpstreamPoll {
                run_id: run_id.to_string(),
                status: e.status(),
                message: e.to_string(),
            })?;

        if let RunStatus::Other(raw) = run.run_status() {
            warn!(run_id, status = %raw, "Unrecognized Apify run status, treating as in progress");
        }

        phase = phase.observe(&run);
        info!(run_id, status = %run.status, attempt = attempts, "Apify run status");

        match phase {
            RunPhase::Done {
                dataset_id: Some(ref dataset_id),
            } => return Ok(dataset_id.clone()),
            RunPhase::Done { dataset_id: None } => {
                return Err(HarvestError::UpstreamPoll {
                    run_id: run_id.to_string(),
                    status: None,
                    message: "run succeeded without a default dataset".into(),
                })
            }
            RunPhase::FailedTerminal { ref status } => {
                return Err(HarvestError::UpstreamRunFailed {
                    run_id: run_id.to_string(),
                    status: status.clone(),
                })
            }
            _ => {}
        }

        let waited = started.elapsed();
        let next_poll_overruns = waited
            .checked_add(policy.interval)
            .map_or(true, |next| next > policy.max_wait);
        if attempts >= policy.max_attempts || next_poll_overruns {
            phase = phase.time_out();
            warn!(
                run_id,
                attempts,
                waited_secs = waited.as_secs(),
                ?phase,
                "Giving up on Apify run"
            );
            return Err(HarvestError::UpstreamTimeout {
                run_id: run_id.to_string(),
                attempts,
                waited_secs: waited.as_secs(),
            });
        }

        tokio::time::sleep(policy.interval).await;
    }
}
