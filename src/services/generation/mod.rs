//! Generation
//!
//! Model invocation, JSON extraction, schema validation and the retry-once
//! policy.

pub mod client;
pub mod retry;
pub mod validator;

pub use client::{
    extract_json, CompletionOptions, GenerationClient, GenerationOutput, LlmGenerationClient,
};
pub use retry::{generate_validated, GenerationFailed, GenerationProfile, TaskKind, Validated};
pub use validator::{
    is_valid_headline_evaluation, validate_headline_evaluation, validate_stimulus_evaluation,
    validate_stimulus_summary, SchemaViolation,
};
