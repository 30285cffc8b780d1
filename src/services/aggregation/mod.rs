//! Aggregation
//!
//! Panel-level results computed once per completed run.

pub mod headline;
pub mod stimulus;

pub use headline::{aggregate_headlines, classify_consensus};
pub use stimulus::{aggregate_stimulus, compute_scores, frequency_insights, summarize_stimulus};
