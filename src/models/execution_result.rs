//! Outcome of a record or of a single test step.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Execution result of a test record.
///
/// `None` stands for "no result recorded" and has no wire id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionResult {
    #[default]
    None,
    Passed,
    Failed,
    Blocked,
}

impl ExecutionResult {
    /// Enum option id sent to the service, if any.
    pub fn as_id(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Passed => Some("passed"),
            Self::Failed => Some("failed"),
            Self::Blocked => Some("blocked"),
        }
    }

    /// Parse from an enum option id.
    pub fn from_id(id: Option<&str>) -> Self {
        match id {
            None => Self::None,
            Some("passed") => Self::Passed,
            Some("failed") => Self::Failed,
            Some("blocked") => Self::Blocked,
            Some(other) => {
                warn!("Unknown result id '{}', treating as failed", other);
                Self::Failed
            }
        }
    }
}

impl std::fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_id().unwrap_or("none"))
    }
}
