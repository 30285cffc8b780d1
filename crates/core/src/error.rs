//! Core Error Types
//!
//! Errors raised by the lifecycle state machine. The root crate wraps these
//! in `PanelError`, next to the storage and generation variants.

use thiserror::Error;

use crate::lifecycle::TestStatus;

/// Core error type for the Focus Panel workspace.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// A lifecycle transition that the state machine does not allow
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: TestStatus, to: TestStatus },

    /// Unrecognised status label read from storage
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
