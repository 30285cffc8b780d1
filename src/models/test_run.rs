//! Test Run Models
//!
//! The configured run, status updates written during its lifecycle, and the
//! summary returned to the caller of `run_test`.

use chrono::{DateTime, Utc};
use focus_panel_core::TestStatus;
use focus_panel_llm::UsageStats;
use serde::{Deserialize, Serialize};

use super::aggregate::{AggregatedResult, Consensus};
use super::archetype::Calibration;
use super::stimulus::Stimulus;

/// What a test evaluates and with whom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    pub stimulus: Stimulus,
    pub archetype_ids: Vec<String>,
    #[serde(default)]
    pub calibration: Calibration,
    /// Product category, e.g. "meal kits"
    #[serde(default)]
    pub category: String,
}

/// A test run and its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    pub id: String,
    pub config: TestConfig,
    pub status: TestStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl TestRun {
    /// A fresh run in `draft`.
    pub fn draft(id: impl Into<String>, config: TestConfig) -> Self {
        Self {
            id: id.into(),
            config,
            status: TestStatus::Draft,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }
}

/// A status write. `None` timestamps leave the stored value untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: TestStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl StatusUpdate {
    pub fn running(at: DateTime<Utc>) -> Self {
        Self {
            status: TestStatus::Running,
            started_at: Some(at),
            completed_at: None,
            error_message: None,
        }
    }

    pub fn completed(at: DateTime<Utc>) -> Self {
        Self {
            status: TestStatus::Completed,
            started_at: None,
            completed_at: Some(at),
            error_message: None,
        }
    }

    pub fn failed(at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            status: TestStatus::Failed,
            started_at: None,
            completed_at: Some(at),
            error_message: Some(message.into()),
        }
    }
}

/// Headline figure of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunHeadline {
    Scores {
        pressure_score: u8,
        gut_attraction_index: u8,
        credibility_score: u8,
    },
    Ranking {
        winner_index: usize,
        winner_headline: String,
        winner_avg_score: f64,
        margin: f64,
        consensus: Consensus,
    },
}

impl From<&AggregatedResult> for RunHeadline {
    fn from(result: &AggregatedResult) -> Self {
        match result {
            AggregatedResult::Stimulus(s) => RunHeadline::Scores {
                pressure_score: s.pressure_score,
                gut_attraction_index: s.gut_attraction_index,
                credibility_score: s.credibility_score,
            },
            AggregatedResult::Headline(h) => RunHeadline::Ranking {
                winner_index: h.winner.index,
                winner_headline: h.winner.headline.clone(),
                winner_avg_score: h.winner.avg_score,
                margin: h.margin,
                consensus: h.consensus,
            },
        }
    }
}

/// Returned by `run_test` for a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub test_id: String,
    pub status: TestStatus,
    pub response_count: usize,
    pub failed_count: usize,
    pub execution_time_ms: u64,
    pub summary: RunHeadline,
    pub usage: UsageStats,
}
