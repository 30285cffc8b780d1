//! Integration Tests Module
//!
//! Integration tests for the Focus Panel engine. Tests drive full runs through
//! the orchestrator against an in-memory SQLite store and a scripted model.

// Shared fixtures: mock provider, recording store, answer builders
mod support;

// Run lifecycle, retries, usage accounting, cancellation and timeout
mod orchestrator_test;

// Headline tournaments end to end
mod headline_tournament_test;

// Moderator intervention heuristics
mod moderator_test;
