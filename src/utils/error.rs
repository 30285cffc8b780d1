//! Error Handling
//!
//! Unified error type for the panel engine.
//! Uses thiserror for ergonomic error definitions.

use focus_panel_core::CoreError;
use focus_panel_llm::LlmError;
use thiserror::Error;

use crate::services::generation::validator::SchemaViolation;

/// Engine-wide error type
#[derive(Error, Debug)]
pub enum PanelError {
    /// Missing archetype or test
    #[error("Not found: {0}")]
    NotFound(String),

    /// Illegal lifecycle transition attempted
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Model output failed schema validation
    #[error("Validation error: {}", format_violations(.0))]
    Validation(Vec<SchemaViolation>),

    /// Network/provider failure while generating
    #[error("Generation error: {0}")]
    Generation(#[from] LlmError),

    /// Fewer usable responses than a run needs after retries
    #[error("Insufficient responses: {succeeded} succeeded, {required} required")]
    InsufficientResponses { succeeded: usize, required: usize },

    /// Run was cancelled or exceeded its deadline
    #[error("Run cancelled: {0}")]
    Cancelled(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(String),

    /// SQLite errors (auto-converted from rusqlite::Error)
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// The run was rejected before anything was written; wraps the reason
    #[error("Run not started: {0}")]
    NotStarted(Box<PanelError>),
}

/// Result type alias for engine errors
pub type PanelResult<T> = Result<T, PanelError>;

fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl PanelError {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Mark an error as raised before the run started. Already-marked errors
    /// are returned unchanged.
    pub fn not_started(err: PanelError) -> Self {
        if err.is_pre_start() {
            err
        } else {
            PanelError::NotStarted(Box::new(err))
        }
    }

    /// True when the run was rejected before any state was written.
    pub fn is_pre_start(&self) -> bool {
        matches!(self, PanelError::NotStarted(_))
    }

    /// The underlying error, looking through [`PanelError::NotStarted`].
    pub fn root_cause(&self) -> &PanelError {
        match self {
            PanelError::NotStarted(inner) => inner.root_cause(),
            other => other,
        }
    }
}

impl From<CoreError> for PanelError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidTransition { from, to } => {
                PanelError::InvalidState(format!("cannot move test from {} to {}", from, to))
            }
            CoreError::Parse(msg) => PanelError::Internal(msg),
        }
    }
}
