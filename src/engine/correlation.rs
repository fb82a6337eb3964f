use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Opaque marker threaded through a dispatch and echoed back in a job name.
///
/// Minted once per orchestration call and never reused. The workflow is
/// expected to put it into one of its job names, e.g.
/// `name: build-${{ inputs.correlation_id }}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `name` contains this token verbatim.
    pub fn appears_in(&self, name: &str) -> bool {
        name.contains(self.0.as_str())
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
