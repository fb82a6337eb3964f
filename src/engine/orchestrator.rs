//! The one externally visible operation: `run_workflow`.
//!
//! A call dispatches once, resolves the run carrying its correlation token,
//! then interleaves status checks and step polling until the run is terminal.
//! All per-call state (token, seen-set, resolved run) lives on the stack of
//! `run_workflow`, so one `Orchestrator` can serve many concurrent calls.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::clock::{Clock, sleep_or_cancel};
use super::correlation::CorrelationToken;
use super::dispatcher::{DispatchRequest, RunDispatcher};
use super::events::{EventSink, RunEvent};
use super::outcome::{Outcome, OutcomeResolver};
use super::progress::{ProgressTracker, SeenSteps};
use super::resolver::{ResolvePolicy, ResolvedRun, RunResolver};
use super::state::RunState;
use crate::errors::WorkflowError;
use crate::github::ActionsApi;

/// Default workflow input that receives the correlation token.
pub const DEFAULT_CORRELATION_INPUT: &str = "correlation_id";

/// Default delay between monitoring polls.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(5);

/// Polling cadence and wire details for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub resolve: ResolvePolicy,
    pub monitor_interval: Duration,
    /// Name of the `workflow_dispatch` input carrying the token.
    pub correlation_input: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolve: ResolvePolicy::default(),
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            correlation_input: DEFAULT_CORRELATION_INPUT.to_string(),
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRunOutput {
    pub workflow_url: String,
    pub correlation_token: CorrelationToken,
    pub run_id: u64,
}

pub struct Orchestrator {
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    dispatcher: RunDispatcher,
    resolver: RunResolver,
    tracker: ProgressTracker,
    outcome: OutcomeResolver,
}

impl Orchestrator {
    pub fn new(api: Arc<dyn ActionsApi>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            dispatcher: RunDispatcher::new(
                api.clone(),
                clock.clone(),
                config.correlation_input.clone(),
            ),
            resolver: RunResolver::new(api.clone(), clock.clone()),
            tracker: ProgressTracker::new(api.clone()),
            outcome: OutcomeResolver::new(api),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Trigger `workflow_id` on `git_ref` and follow it to completion.
    ///
    /// Long-running: returns only once the remote run is terminal, the
    /// run cannot be found, or `cancel` fires. Cancelling does not cancel the
    /// remote run.
    pub async fn run_workflow(
        &self,
        repo: &str,
        workflow_id: &str,
        git_ref: &str,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<WorkflowRunOutput, WorkflowError> {
        let request = DispatchRequest::new(repo, workflow_id, git_ref)?;
        let token = request.token().clone();
        let mut state = RunState::Idle;

        if cancel.is_cancelled() {
            advance(&mut state, RunState::Cancelled, &token);
            return Err(WorkflowError::Cancelled {
                stage: RunState::Idle,
                token,
            });
        }

        advance(&mut state, RunState::Dispatching, &token);
        let record = match self.dispatcher.trigger(&request).await {
            Ok(record) => record,
            Err(e) => {
                advance(&mut state, RunState::Failed, &token);
                tracing::error!(token = %token, error = %e, "Dispatch rejected");
                return Err(e);
            }
        };
        sink.emit(RunEvent::Dispatched {
            token: token.clone(),
            dispatched_at: record.dispatched_at,
        });

        advance(&mut state, RunState::Resolving, &token);
        let run = match self
            .resolver
            .resolve(&request, record.dispatched_at, &self.config.resolve, cancel)
            .await
        {
            Ok(run) => run,
            Err(e) => {
                let next = if e.is_cancelled() {
                    RunState::Cancelled
                } else {
                    RunState::Failed
                };
                advance(&mut state, next, &token);
                tracing::error!(token = %token, error = %e, "Could not resolve workflow run");
                return Err(e);
            }
        };
        sink.emit(RunEvent::Resolved {
            run_id: run.run_id,
            html_url: run.html_url.clone(),
        });

        advance(&mut state, RunState::Monitoring, &token);
        let result = self.monitor(&request, &run, sink, cancel).await;
        let next = match &result {
            Ok(_) => RunState::Succeeded,
            Err(e) if e.is_cancelled() => RunState::Cancelled,
            Err(_) => RunState::Failed,
        };
        advance(&mut state, next, &token);
        result
    }

    async fn monitor(
        &self,
        request: &DispatchRequest,
        run: &ResolvedRun,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<WorkflowRunOutput, WorkflowError> {
        let repo = request.repo();
        let token = request.token();
        let cancelled = || WorkflowError::Cancelled {
            stage: RunState::Monitoring,
            token: token.clone(),
        };
        let mut seen = SeenSteps::new();
        let mut polls: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled());
            }
            polls += 1;

            // Status first: steps listed after a terminal status are final,
            // so they get reported before we stop.
            let check = match self.outcome.check_terminal(repo, run.run_id).await {
                Ok(check) => Some(check),
                Err(e) => {
                    tracing::warn!(run_id = run.run_id, error = %e, "Failed to fetch run status, will retry");
                    None
                }
            };

            if let Some(check) = &check
                && !check.is_terminal()
            {
                tracing::debug!(
                    run_id = run.run_id,
                    status = check.status.as_deref().unwrap_or("unknown"),
                    polls,
                    "Run not finished yet"
                );
            }

            for step in self.tracker.poll_once(repo, run.run_id, &mut seen).await {
                if cancel.is_cancelled() {
                    return Err(cancelled());
                }
                tracing::info!(
                    run_id = run.run_id,
                    job = %step.job_name,
                    step = %step.step_name,
                    conclusion = step.conclusion.as_deref().unwrap_or("none"),
                    "Step completed"
                );
                sink.emit(RunEvent::StepCompleted(step));
            }

            if let Some(check) = check
                && let Some(outcome) = check.outcome
            {
                let run_url = if check.html_url.is_empty() {
                    run.html_url.clone()
                } else {
                    check.html_url
                };
                sink.emit(RunEvent::Finished {
                    outcome: outcome.clone(),
                });
                return match outcome {
                    Outcome::Success => {
                        tracing::info!(run_id = run.run_id, token = %token, polls, "Workflow completed successfully");
                        Ok(WorkflowRunOutput {
                            workflow_url: run_url,
                            correlation_token: token.clone(),
                            run_id: run.run_id,
                        })
                    }
                    Outcome::Failure(conclusion) => {
                        tracing::error!(run_id = run.run_id, token = %token, conclusion = %conclusion, "Workflow failed");
                        Err(WorkflowError::RemoteRunFailed {
                            workflow_id: request.workflow_id().to_string(),
                            conclusion,
                            run_url,
                            token: token.clone(),
                        })
                    }
                };
            }

            if sleep_or_cancel(self.clock.as_ref(), self.config.monitor_interval, cancel).await {
                return Err(cancelled());
            }
        }
    }
}

fn advance(state: &mut RunState, next: RunState, token: &CorrelationToken) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid transition {} -> {}",
        state,
        next
    );
    tracing::debug!(from = %state, to = %next, token = %token, "Run state transition");
    *state = next;
}
