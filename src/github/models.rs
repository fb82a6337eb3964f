use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run/job/step status once nothing else will change.
pub const STATUS_COMPLETED: &str = "completed";

/// The only conclusion that counts as a passing run.
pub const CONCLUSION_SUCCESS: &str = "success";

/// A workflow run (subset of fields we care about).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    /// Workflow file path, e.g. `.github/workflows/ci.yaml`.
    #[serde(default)]
    pub path: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

/// Envelope returned by `GET /repos/{repo}/actions/runs`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkflowRunList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
}

/// A job within a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Queued jobs come back without steps.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A step within a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub number: Option<u64>,
}

impl Step {
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

/// Envelope returned by `GET /repos/{repo}/actions/runs/{id}/jobs`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// Body of `POST /repos/{repo}/actions/workflows/{id}/dispatches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub inputs: BTreeMap<String, String>,
}
