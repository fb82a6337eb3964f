//! Typed error hierarchy for wfrelay.
//!
//! Two enums cover the two layers:
//! - `ApiError`: a single call against the GitHub REST surface failed
//! - `WorkflowError`: a `run_workflow` call ended without success
//!
//! `ApiError` is transient during run resolution and monitoring: the engine
//! logs it and tries again on the next poll. Only dispatch turns it fatal.

use thiserror::Error;

use crate::engine::{CorrelationToken, RunState};

/// Failure of one request against the Actions API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("GitHub returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request to GitHub failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode GitHub response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status code when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }
}

/// Terminal failure of a workflow orchestration.
///
/// Every variant raised after the correlation token exists carries it, so a
/// human can find the run by hand when automation gives up.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "No GitHub token configured for {host}. Set WFRELAY_GITHUB_TOKEN or add an \
         [[integrations.github]] entry for this host to wfrelay.toml"
    )]
    MissingToken { host: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to trigger workflow '{workflow_id}' on '{repo}' (token={token}): {source}")]
    DispatchFailed {
        repo: String,
        workflow_id: String,
        token: CorrelationToken,
        #[source]
        source: ApiError,
    },

    #[error(
        "Workflow run for '{workflow_id}' with token={token} not found after {attempts} attempts"
    )]
    ResolutionTimeout {
        workflow_id: String,
        attempts: u32,
        token: CorrelationToken,
    },

    #[error("Workflow '{workflow_id}' failed: {conclusion} ({run_url}, token={token})")]
    RemoteRunFailed {
        workflow_id: String,
        conclusion: String,
        run_url: String,
        token: CorrelationToken,
    },

    #[error("Cancelled while {stage} (token={token})")]
    Cancelled {
        stage: RunState,
        token: CorrelationToken,
    },
}

impl WorkflowError {
    /// Correlation token of the call that failed, if one had been minted.
    pub fn correlation_token(&self) -> Option<&CorrelationToken> {
        match self {
            WorkflowError::DispatchFailed { token, .. }
            | WorkflowError::ResolutionTimeout { token, .. }
            | WorkflowError::RemoteRunFailed { token, .. }
            | WorkflowError::Cancelled { token, .. } => Some(token),
            WorkflowError::Config(_)
            | WorkflowError::MissingToken { .. }
            | WorkflowError::InvalidRequest(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkflowError::Cancelled { .. })
    }
}
