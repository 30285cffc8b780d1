//! Validated Generation
//!
//! Runs one generation task against its schema, retrying exactly once at a
//! slightly higher temperature when the call fails or the output does not
//! validate.

use focus_panel_llm::UsageStats;
use serde_json::Value;
use tracing::{debug, warn};

use super::client::{CompletionOptions, GenerationClient};
use super::validator::SchemaViolation;
use crate::utils::error::PanelError;

/// Temperature added for the single retry.
pub const RETRY_TEMPERATURE_STEP: f32 = 0.1;

/// Attempts per task: the first call plus one retry.
pub const MAX_ATTEMPTS: u8 = 2;

/// The kinds of generation the engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// A persona reacting to free-form copy
    StimulusEvaluation,
    /// A persona ranking a headline list
    HeadlineEvaluation,
    /// Summarising the panel into strengths/weaknesses/recommendations
    StimulusSummary,
}

/// Fixed sampling profile for a task kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationProfile {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl TaskKind {
    pub fn profile(&self) -> GenerationProfile {
        match self {
            TaskKind::StimulusEvaluation => GenerationProfile {
                temperature: 0.7,
                max_tokens: 1500,
            },
            TaskKind::HeadlineEvaluation => GenerationProfile {
                temperature: 0.7,
                max_tokens: 2000,
            },
            TaskKind::StimulusSummary => GenerationProfile {
                temperature: 0.3,
                max_tokens: 2000,
            },
        }
    }

    /// Temperature for the 1-based `attempt`.
    pub fn temperature_for_attempt(&self, attempt: u8) -> f32 {
        let base = self.profile().temperature;
        if attempt > 1 {
            base + RETRY_TEMPERATURE_STEP
        } else {
            base
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::StimulusEvaluation => "stimulus_evaluation",
            TaskKind::HeadlineEvaluation => "headline_evaluation",
            TaskKind::StimulusSummary => "stimulus_summary",
        }
    }
}

/// Output that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub value: T,
    /// 1 on first-try success, 2 after the retry
    pub attempts: u8,
    /// Tokens spent across all attempts
    pub usage: UsageStats,
}

/// Both attempts failed. Carries the last error.
#[derive(Debug)]
pub struct GenerationFailed {
    pub error: PanelError,
    pub attempts: u8,
    pub usage: UsageStats,
}

/// Generate and validate, retrying once at `temperature + 0.1`.
///
/// Schema violations and transient provider errors are retried. Provider
/// errors that cannot succeed on a retry (bad credentials, rejected request,
/// unknown model) give up after the first attempt. Failures only escape as
/// [`GenerationFailed`].
pub async fn generate_validated<T, F>(
    client: &dyn GenerationClient,
    task: TaskKind,
    system: &str,
    prompt: &str,
    validate: F,
) -> Result<Validated<T>, GenerationFailed>
where
    F: Fn(&Value) -> Result<T, Vec<SchemaViolation>>,
{
    let profile = task.profile();
    let mut usage = UsageStats::default();
    let mut last_error = PanelError::internal("generation was not attempted");

    for attempt in 1..=MAX_ATTEMPTS {
        let options = CompletionOptions {
            system: Some(system.to_string()),
            temperature: task.temperature_for_attempt(attempt),
            max_tokens: profile.max_tokens,
        };

        debug!(
            task = task.as_str(),
            attempt,
            temperature = options.temperature,
            "requesting generation"
        );

        let (error, retryable) = match client.complete(prompt, &options).await {
            Ok(output) => {
                usage.accumulate(&output.usage);
                match validate(&output.parsed) {
                    Ok(value) => {
                        return Ok(Validated {
                            value,
                            attempts: attempt,
                            usage,
                        })
                    }
                    Err(violations) => (PanelError::Validation(violations), true),
                }
            }
            Err(e) => {
                let transient = e.is_transient();
                (PanelError::Generation(e), transient)
            }
        };

        warn!(
            task = task.as_str(),
            attempt,
            retryable,
            error = %error,
            "generation attempt failed"
        );

        // Auth failures and rejected requests fail the same way on a retry
        if !retryable {
            return Err(GenerationFailed {
                error,
                attempts: attempt,
                usage,
            });
        }
        last_error = error;
    }

    Err(GenerationFailed {
        error: last_error,
        attempts: MAX_ATTEMPTS,
        usage,
    })
}
