use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::clock::Clock;
use super::correlation::CorrelationToken;
use crate::errors::WorkflowError;
use crate::github::models::DispatchPayload;
use crate::github::{ActionsApi, RepoSlug};

/// Everything needed to trigger one run. Built once per call.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    repo: RepoSlug,
    workflow_id: String,
    git_ref: String,
    token: CorrelationToken,
}

impl DispatchRequest {
    /// Validate identifiers and mint a fresh correlation token.
    /// The ref is left for GitHub to resolve.
    pub fn new(repo: &str, workflow_id: &str, git_ref: &str) -> Result<Self, WorkflowError> {
        let repo: RepoSlug = repo.parse()?;
        let workflow_id = workflow_id.trim();
        if workflow_id.is_empty() {
            return Err(WorkflowError::InvalidRequest(
                "workflow id must not be empty".to_string(),
            ));
        }
        Ok(Self {
            repo,
            workflow_id: workflow_id.to_string(),
            git_ref: git_ref.to_string(),
            token: CorrelationToken::generate(),
        })
    }

    pub fn repo(&self) -> &RepoSlug {
        &self.repo
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn git_ref(&self) -> &str {
        &self.git_ref
    }

    pub fn token(&self) -> &CorrelationToken {
        &self.token
    }

    /// Trigger body with the token under `input_key`.
    pub fn payload(&self, input_key: &str) -> DispatchPayload {
        let mut inputs = BTreeMap::new();
        inputs.insert(input_key.to_string(), self.token.to_string());
        DispatchPayload {
            git_ref: self.git_ref.clone(),
            inputs,
        }
    }
}

/// Proof of an accepted trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchRecord {
    /// Taken just before the trigger was sent. Runs created earlier than this
    /// are never candidates.
    pub dispatched_at: DateTime<Utc>,
}

/// Sends the one and only trigger for a call.
pub struct RunDispatcher {
    api: Arc<dyn ActionsApi>,
    clock: Arc<dyn Clock>,
    input_key: String,
}

impl RunDispatcher {
    pub fn new(api: Arc<dyn ActionsApi>, clock: Arc<dyn Clock>, input_key: impl Into<String>) -> Self {
        Self {
            api,
            clock,
            input_key: input_key.into(),
        }
    }

    /// Never retried: GitHub cannot tell us whether a failed trigger still
    /// created a run, and a second attempt could start a duplicate.
    pub async fn trigger(&self, request: &DispatchRequest) -> Result<DispatchRecord, WorkflowError> {
        let dispatched_at = self.clock.now();
        tracing::info!(
            repo = %request.repo(),
            workflow = request.workflow_id(),
            git_ref = request.git_ref(),
            token = %request.token(),
            "Triggering workflow"
        );

        self.api
            .dispatch_workflow(
                request.repo(),
                request.workflow_id(),
                &request.payload(&self.input_key),
            )
            .await
            .map_err(|source| WorkflowError::DispatchFailed {
                repo: request.repo().to_string(),
                workflow_id: request.workflow_id().to_string(),
                token: request.token().clone(),
                source,
            })?;

        Ok(DispatchRecord { dispatched_at })
    }
}
