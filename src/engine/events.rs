use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use super::correlation::CorrelationToken;
use super::outcome::Outcome;
use super::progress::StepCompleted;

/// Notifications emitted while a workflow call is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// The trigger was accepted.
    Dispatched {
        token: CorrelationToken,
        dispatched_at: DateTime<Utc>,
    },
    /// The run carrying our token was found.
    Resolved { run_id: u64, html_url: String },
    /// A step was observed completed for the first time.
    StepCompleted(StepCompleted),
    /// The run reached a terminal state.
    Finished { outcome: Outcome },
}

/// Receiver for `RunEvent`s. Called inline from the poll loop, so it must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RunEvent);
}

impl EventSink for mpsc::UnboundedSender<RunEvent> {
    fn emit(&self, event: RunEvent) {
        // Receiver gone means nobody is listening any more; the run carries on.
        let _ = self.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: RunEvent) {}
}
