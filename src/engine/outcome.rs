use std::sync::Arc;

use serde::Serialize;

use crate::errors::ApiError;
use crate::github::models::{CONCLUSION_SUCCESS, STATUS_COMPLETED, WorkflowRun};
use crate::github::{ActionsApi, RepoSlug};

/// Reason used when a completed run reports no conclusion.
const UNKNOWN_CONCLUSION: &str = "unknown";

/// Final classification of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    /// Carries the remote conclusion verbatim (`failure`, `cancelled`, `timed_out`, ...).
    Failure(String),
}

impl Outcome {
    pub fn from_conclusion(conclusion: Option<&str>) -> Self {
        match conclusion {
            Some(CONCLUSION_SUCCESS) => Outcome::Success,
            Some(other) if !other.is_empty() => Outcome::Failure(other.to_string()),
            _ => Outcome::Failure(UNKNOWN_CONCLUSION.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Result of one status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalCheck {
    /// Only set once the run is terminal.
    pub outcome: Option<Outcome>,
    pub status: Option<String>,
    pub html_url: String,
}

impl TerminalCheck {
    pub fn from_run(run: &WorkflowRun) -> Self {
        let terminal = run.status.as_deref() == Some(STATUS_COMPLETED);
        Self {
            outcome: terminal.then(|| Outcome::from_conclusion(run.conclusion.as_deref())),
            status: run.status.clone(),
            html_url: run.html_url.clone(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Decides when a run has finished and how.
pub struct OutcomeResolver {
    api: Arc<dyn ActionsApi>,
}

impl OutcomeResolver {
    pub fn new(api: Arc<dyn ActionsApi>) -> Self {
        Self { api }
    }

    pub async fn check_terminal(
        &self,
        repo: &RepoSlug,
        run_id: u64,
    ) -> Result<TerminalCheck, ApiError> {
        let run = self.api.get_run(repo, run_id).await?;
        Ok(TerminalCheck::from_run(&run))
    }
}
