//! Dispatch-and-correlation engine.
//!
//! A `run_workflow` call moves through:
//!
//! 1. `dispatcher`: send one `workflow_dispatch` trigger carrying a fresh token
//! 2. `resolver`: poll the run listing until a job name carries the token
//! 3. `progress` + `outcome`: poll jobs and run status until the run is terminal
//!
//! `orchestrator` sequences these and owns the cancellation and event plumbing.

pub mod clock;
pub mod correlation;
pub mod dispatcher;
pub mod events;
pub mod orchestrator;
pub mod outcome;
pub mod progress;
pub mod resolver;
pub mod state;

#[cfg(test)]
pub mod testing;

pub use clock::{Clock, SystemClock, cancel_after};
pub use correlation::CorrelationToken;
pub use events::{EventSink, NoopSink, RunEvent};
pub use orchestrator::{EngineConfig, Orchestrator, WorkflowRunOutput};
pub use outcome::Outcome;
pub use progress::StepCompleted;
pub use resolver::ResolvePolicy;
pub use state::RunState;
