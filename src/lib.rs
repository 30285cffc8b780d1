//! Focus Panel
//!
//! Synthetic focus-group engine. A marketing stimulus (free text or a list of
//! headlines) is put in front of simulated consumer personas voiced by a
//! generative model; their structured answers are validated, retried once
//! when malformed, and aggregated into panel scores, rankings and insights.
//!
//! It includes:
//! - Data models (archetypes, stimuli, test runs, responses, aggregates, settings)
//! - Services (persona contexts, prompts, generation, orchestrator, aggregators,
//!   moderator heuristics)
//! - Storage layer (SQLite store, JSON config)
//! - Error type and path utilities

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use focus_panel_core::TestStatus;
pub use services::{GenerationClient, OrchestratorSettings, RateLimiter, TestOrchestrator};
pub use storage::{ConfigService, SqliteStore, Store};
pub use utils::error::{PanelError, PanelResult};
