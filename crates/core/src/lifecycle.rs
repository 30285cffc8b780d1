//! Test Run Lifecycle
//!
//! The status state machine for a test run:
//!
//! ```text
//! draft ──> running ──> completed
//!                  └──> failed
//! ```
//!
//! `completed` and `failed` are terminal; nothing leaves them.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Lifecycle status of a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Draft,
    Running,
    Completed,
    Failed,
}

impl TestStatus {
    /// Storage / wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Draft => "draft",
            TestStatus::Running => "running",
            TestStatus::Completed => "completed",
            TestStatus::Failed => "failed",
        }
    }

    /// Whether the status is final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TestStatus::Completed | TestStatus::Failed)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: TestStatus) -> bool {
        matches!(
            (self, next),
            (TestStatus::Draft, TestStatus::Running)
                | (TestStatus::Running, TestStatus::Completed)
                | (TestStatus::Running, TestStatus::Failed)
        )
    }

    /// Return `next` if the transition is legal.
    pub fn transition(&self, next: TestStatus) -> CoreResult<TestStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TestStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TestStatus::Draft),
            "running" => Ok(TestStatus::Running),
            "completed" => Ok(TestStatus::Completed),
            "failed" => Ok(TestStatus::Failed),
            other => Err(CoreError::parse(format!("unknown test status: {}", other))),
        }
    }
}
