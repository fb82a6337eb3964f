use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use super::clock::{Clock, sleep_or_cancel};
use super::dispatcher::DispatchRequest;
use super::state::RunState;
use crate::errors::WorkflowError;
use crate::github::ActionsApi;
use crate::github::models::WorkflowRun;

/// Default number of listing attempts before giving up.
pub const DEFAULT_RESOLVE_ATTEMPTS: u32 = 12;

/// Default spacing between listing attempts.
pub const DEFAULT_RESOLVE_INTERVAL: Duration = Duration::from_secs(5);

/// Attempt budget for finding the dispatched run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvePolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ResolvePolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RESOLVE_ATTEMPTS,
            interval: DEFAULT_RESOLVE_INTERVAL,
        }
    }
}

/// A listed run that might be ours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCandidate {
    pub run_id: u64,
    pub workflow_path: String,
    pub created_at: DateTime<Utc>,
    pub html_url: String,
}

/// The run that carries our token. Fixed for the rest of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRun {
    pub run_id: u64,
    pub html_url: String,
}

/// Runs of `workflow_id` created at or after `not_before`, in listing order.
pub fn filter_candidates(
    runs: &[WorkflowRun],
    workflow_id: &str,
    not_before: DateTime<Utc>,
) -> Vec<RunCandidate> {
    runs.iter()
        .filter_map(|run| {
            let path = run.path.as_deref()?;
            (path.ends_with(workflow_id) && run.created_at >= not_before).then(|| RunCandidate {
                run_id: run.id,
                workflow_path: path.to_string(),
                created_at: run.created_at,
                html_url: run.html_url.clone(),
            })
        })
        .collect()
}

/// Finds the run a dispatch created by looking for the token in job names.
///
/// GitHub's dispatch endpoint returns no run id, so the run has to be
/// rediscovered from the listing. Listing and per-candidate fetch failures
/// only cost the current attempt.
pub struct RunResolver {
    api: Arc<dyn ActionsApi>,
    clock: Arc<dyn Clock>,
}

impl RunResolver {
    pub fn new(api: Arc<dyn ActionsApi>, clock: Arc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    pub async fn resolve(
        &self,
        request: &DispatchRequest,
        not_before: DateTime<Utc>,
        policy: &ResolvePolicy,
        cancel: &CancellationToken,
    ) -> Result<ResolvedRun, WorkflowError> {
        let cancelled = || WorkflowError::Cancelled {
            stage: RunState::Resolving,
            token: request.token().clone(),
        };

        for attempt in 1..=policy.max_attempts {
            if cancel.is_cancelled() {
                return Err(cancelled());
            }

            if let Some(run) = self.attempt(request, not_before, attempt).await {
                return Ok(run);
            }

            if attempt < policy.max_attempts
                && sleep_or_cancel(self.clock.as_ref(), policy.interval, cancel).await
            {
                return Err(cancelled());
            }
        }

        Err(WorkflowError::ResolutionTimeout {
            workflow_id: request.workflow_id().to_string(),
            attempts: policy.max_attempts,
            token: request.token().clone(),
        })
    }

    async fn attempt(
        &self,
        request: &DispatchRequest,
        not_before: DateTime<Utc>,
        attempt: u32,
    ) -> Option<ResolvedRun> {
        let runs = match self.api.list_dispatch_runs(request.repo()).await {
            Ok(runs) => runs,
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Failed to list workflow runs");
                return None;
            }
        };

        let candidates = filter_candidates(&runs, request.workflow_id(), not_before);
        tracing::debug!(
            attempt,
            listed = runs.len(),
            candidates = candidates.len(),
            "Scanning workflow runs"
        );

        for candidate in candidates {
            let jobs = match self.api.list_jobs(request.repo(), candidate.run_id).await {
                Ok(jobs) => jobs,
                Err(e) => {
                    tracing::warn!(run_id = candidate.run_id, error = %e, "Failed to fetch candidate jobs");
                    continue;
                }
            };

            if jobs.iter().any(|job| request.token().appears_in(&job.name)) {
                tracing::info!(
                    run_id = candidate.run_id,
                    token = %request.token(),
                    attempt,
                    "Matched run via job name"
                );
                return Some(ResolvedRun {
                    run_id: candidate.run_id,
                    html_url: candidate.html_url,
                });
            }
        }

        None
    }
}
