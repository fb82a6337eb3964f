use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::github::models::Job;
use crate::github::{ActionsApi, RepoSlug};

/// Identity of a step across polls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepKey {
    pub job_id: u64,
    pub step_name: String,
}

/// Steps already reported during one call. Only ever grows.
#[derive(Debug, Default)]
pub struct SeenSteps {
    keys: HashSet<StepKey>,
}

impl SeenSteps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the key was not present before.
    pub fn insert(&mut self, key: StepKey) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &StepKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A step observed in the `completed` state for the first time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepCompleted {
    pub job_id: u64,
    pub job_name: String,
    pub step_name: String,
    pub conclusion: Option<String>,
}

/// Diff a jobs snapshot against `seen`, in listing order (job, then step).
pub fn collect_completed(jobs: &[Job], seen: &mut SeenSteps) -> Vec<StepCompleted> {
    let mut fresh = Vec::new();
    for job in jobs {
        for step in job.steps.iter().filter(|s| s.is_completed()) {
            let key = StepKey {
                job_id: job.id,
                step_name: step.name.clone(),
            };
            if seen.insert(key) {
                fresh.push(StepCompleted {
                    job_id: job.id,
                    job_name: job.name.clone(),
                    step_name: step.name.clone(),
                    conclusion: step.conclusion.clone(),
                });
            }
        }
    }
    fresh
}

/// Polls a resolved run's jobs and reports newly completed steps.
pub struct ProgressTracker {
    api: Arc<dyn ActionsApi>,
}

impl ProgressTracker {
    pub fn new(api: Arc<dyn ActionsApi>) -> Self {
        Self { api }
    }

    /// One poll. A failed fetch yields nothing; the next poll retries.
    pub async fn poll_once(
        &self,
        repo: &RepoSlug,
        run_id: u64,
        seen: &mut SeenSteps,
    ) -> Vec<StepCompleted> {
        match self.api.list_jobs(repo, run_id).await {
            Ok(jobs) => collect_completed(&jobs, seen),
            Err(e) => {
                tracing::warn!(run_id, error = %e, "Failed to fetch jobs, will retry next poll");
                Vec::new()
            }
        }
    }
}
