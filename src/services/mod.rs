//! Services
//!
//! Panel engine logic: persona contexts, prompts, generation with validation,
//! the run orchestrator, aggregation and moderator heuristics.

pub mod aggregation;
pub mod generation;
pub mod moderator;
pub mod orchestrator;
pub mod persona;
pub mod prompts;

pub use generation::{GenerationClient, LlmGenerationClient};
pub use orchestrator::{OrchestratorSettings, RateLimiter, TestOrchestrator};
