//! In-memory doubles for engine tests: a scripted `ActionsApi`, a virtual
//! clock and a recording event sink.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use super::clock::Clock;
use super::events::{EventSink, RunEvent};
use super::progress::StepCompleted;
use crate::errors::ApiError;
use crate::github::models::{DispatchPayload, Job, Step, WorkflowRun};
use crate::github::{ActionsApi, RepoSlug};

/// Placeholder in scripted job names, replaced by the dispatched token.
pub const TOKEN: &str = "{token}";

pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, h, m, s).unwrap()
}

pub fn run(id: u64, path: &str, created_at: DateTime<Utc>) -> WorkflowRun {
    WorkflowRun {
        id,
        path: Some(path.to_string()),
        created_at,
        status: Some("queued".to_string()),
        conclusion: None,
        html_url: format!("https://github.com/org/repo/actions/runs/{}", id),
    }
}

pub fn run_status(id: u64, status: &str, conclusion: Option<&str>) -> WorkflowRun {
    WorkflowRun {
        status: Some(status.to_string()),
        conclusion: conclusion.map(str::to_string),
        ..run(id, ".github/workflows/ci.yaml", at(12, 0, 5))
    }
}

pub fn job(id: u64, name: &str, steps: Vec<Step>) -> Job {
    Job {
        id,
        name: name.to_string(),
        steps,
    }
}

pub fn step(name: &str, status: &str, conclusion: Option<&str>) -> Step {
    Step {
        name: name.to_string(),
        status: status.to_string(),
        conclusion: conclusion.map(str::to_string),
        number: None,
    }
}

pub fn done(name: &str) -> Step {
    step(name, "completed", Some("success"))
}

pub fn pending(name: &str) -> Step {
    step(name, "queued", None)
}

/// A remote call as observed by `FakeActions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Dispatch { workflow_id: String, payload: DispatchPayload },
    ListRuns,
    ListJobs(u64),
    GetRun(u64),
}

type Reply<T> = Result<T, u16>;

/// Queue of replies; the last one repeats once the queue is drained.
struct Script<T: Clone> {
    replies: VecDeque<Reply<T>>,
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Option<Reply<T>> {
        if self.replies.len() > 1 {
            self.replies.pop_front()
        } else {
            self.replies.front().cloned()
        }
    }
}

#[derive(Default)]
struct FakeState {
    dispatch_status: Option<u16>,
    runs: Option<Script<Vec<WorkflowRun>>>,
    jobs: HashMap<u64, Script<Vec<Job>>>,
    status: HashMap<u64, Script<WorkflowRun>>,
    tokens: Vec<String>,
    echoes: HashMap<u64, usize>,
    calls: Vec<Call>,
}

/// Scripted `ActionsApi`. Unscripted endpoints answer 404.
#[derive(Default)]
pub struct FakeActions {
    state: Mutex<FakeState>,
}

impl FakeActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the trigger endpoint answer with this non-2xx status.
    pub fn reject_dispatch(self, status: u16) -> Self {
        self.state.lock().unwrap().dispatch_status = Some(status);
        self
    }

    pub fn runs(self, replies: Vec<Reply<Vec<WorkflowRun>>>) -> Self {
        self.state.lock().unwrap().runs = Some(Script {
            replies: replies.into(),
        });
        self
    }

    pub fn jobs(self, run_id: u64, replies: Vec<Reply<Vec<Job>>>) -> Self {
        self.state.lock().unwrap().jobs.insert(
            run_id,
            Script {
                replies: replies.into(),
            },
        );
        self
    }

    pub fn status(self, run_id: u64, replies: Vec<Reply<WorkflowRun>>) -> Self {
        self.state.lock().unwrap().status.insert(
            run_id,
            Script {
                replies: replies.into(),
            },
        );
        self
    }

    /// Job names of `run_id` echo the token of the `slot`-th dispatch
    /// (zero-based) instead of the latest one.
    pub fn echo_dispatch(self, run_id: u64, slot: usize) -> Self {
        self.state.lock().unwrap().echoes.insert(run_id, slot);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Token received by the last dispatch.
    pub fn dispatched_token(&self) -> Option<String> {
        self.state.lock().unwrap().tokens.last().cloned()
    }

    /// Tokens of every accepted dispatch, in arrival order.
    pub fn dispatched_tokens(&self) -> Vec<String> {
        self.state.lock().unwrap().tokens.clone()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn to_api_error(status: u16) -> ApiError {
    ApiError::Status {
        status,
        body: "scripted failure".to_string(),
    }
}

#[async_trait]
impl ActionsApi for FakeActions {
    async fn dispatch_workflow(
        &self,
        _repo: &RepoSlug,
        workflow_id: &str,
        payload: &DispatchPayload,
    ) -> Result<(), ApiError> {
        self.record(Call::Dispatch {
            workflow_id: workflow_id.to_string(),
            payload: payload.clone(),
        });
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.dispatch_status {
            return Err(to_api_error(status));
        }
        if let Some(token) = payload.inputs.values().next() {
            state.tokens.push(token.clone());
        }
        Ok(())
    }

    async fn list_dispatch_runs(&self, _repo: &RepoSlug) -> Result<Vec<WorkflowRun>, ApiError> {
        self.record(Call::ListRuns);
        let mut state = self.state.lock().unwrap();
        match state.runs.as_mut().and_then(Script::next) {
            Some(reply) => reply.map_err(to_api_error),
            None => Ok(Vec::new()),
        }
    }

    async fn list_jobs(&self, _repo: &RepoSlug, run_id: u64) -> Result<Vec<Job>, ApiError> {
        self.record(Call::ListJobs(run_id));
        let mut state = self.state.lock().unwrap();
        let token = match state.echoes.get(&run_id) {
            Some(slot) => state.tokens.get(*slot),
            None => state.tokens.last(),
        }
        .cloned()
        .unwrap_or_default();
        let reply = state
            .jobs
            .get_mut(&run_id)
            .and_then(Script::next)
            .unwrap_or(Err(404));
        reply.map_err(to_api_error).map(|jobs| {
            jobs.into_iter()
                .map(|mut j| {
                    j.name = j.name.replace(TOKEN, &token);
                    j
                })
                .collect()
        })
    }

    async fn get_run(&self, _repo: &RepoSlug, run_id: u64) -> Result<WorkflowRun, ApiError> {
        self.record(Call::GetRun(run_id));
        let mut state = self.state.lock().unwrap();
        state
            .status
            .get_mut(&run_id)
            .and_then(Script::next)
            .unwrap_or(Err(404))
            .map_err(to_api_error)
    }
}

/// Virtual clock: `sleep` advances `now` instantly and records the delay.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        {
            let mut now = self.now.lock().unwrap();
            *now += chrono::Duration::from_std(duration).unwrap();
        }
        tokio::task::yield_now().await;
    }
}

/// Records events; optionally cancels a token after the n-th step event.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RunEvent>>,
    cancel_after_steps: Option<(usize, CancellationToken)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_after_steps(steps: usize, cancel: CancellationToken) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            cancel_after_steps: Some((steps, cancel)),
        }
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn steps(&self) -> Vec<StepCompleted> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::StepCompleted(step) => Some(step),
                _ => None,
            })
            .collect()
    }

    pub fn step_names(&self) -> Vec<String> {
        self.steps().into_iter().map(|s| s.step_name).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: RunEvent) {
        let mut events = self.events.lock().unwrap();
        events.push(event);
        if let Some((limit, cancel)) = &self.cancel_after_steps {
            let steps = events
                .iter()
                .filter(|e| matches!(e, RunEvent::StepCompleted(_)))
                .count();
            if steps >= *limit {
                cancel.cancel();
            }
        }
    }
}
