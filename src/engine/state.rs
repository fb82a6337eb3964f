use std::fmt;

use serde::Serialize;

/// Lifecycle of one `run_workflow` call.
///
/// ```text
/// Idle -> Dispatching -> Resolving -> Monitoring -> Succeeded
///  |          |              |            |   \--> Failed
///  v          v              v            v
/// Cancelled Failed    Failed|Cancelled  Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Dispatching,
    Resolving,
    Monitoring,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Succeeded | RunState::Failed | RunState::Cancelled
        )
    }

    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Idle, Dispatching)
                | (Idle, Cancelled)
                | (Dispatching, Resolving)
                | (Dispatching, Failed)
                | (Resolving, Monitoring)
                | (Resolving, Failed)
                | (Resolving, Cancelled)
                | (Monitoring, Succeeded)
                | (Monitoring, Failed)
                | (Monitoring, Cancelled)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Dispatching => "dispatching",
            RunState::Resolving => "resolving",
            RunState::Monitoring => "monitoring",
            RunState::Succeeded => "succeeded",
            RunState::Failed => "failed",
            RunState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}
