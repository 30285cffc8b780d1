//! Focus Panel Core
//!
//! Foundational types for the Focus Panel workspace. This crate has no
//! dependencies on storage, HTTP or async runtimes.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `lifecycle` - Test run status state machine (`TestStatus`)
//! - `keywords` - Tokenisation helpers for keyword overlap and phrase matching

pub mod error;
pub mod keywords;
pub mod lifecycle;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Lifecycle ──────────────────────────────────────────────────────────
pub use lifecycle::TestStatus;
