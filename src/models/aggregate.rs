//! Aggregated Result Models
//!
//! Panel-level outputs computed once per completed run.

use serde::{Deserialize, Serialize};

/// Confidence / severity / priority tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    pub fn parse(label: &str) -> Option<Level> {
        match label.trim().to_lowercase().as_str() {
            "high" => Some(Level::High),
            "medium" => Some(Level::Medium),
            "low" => Some(Level::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strength {
    pub point: String,
    pub confidence: Level,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weakness {
    pub point: String,
    pub severity: Level,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: String,
    pub priority: Level,
}

/// Qualitative buckets for a free-form stimulus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StimulusInsights {
    pub strengths: Vec<Strength>,
    pub weaknesses: Vec<Weakness>,
    pub recommendations: Vec<Recommendation>,
}

/// Where the qualitative buckets came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    /// Validated model summarisation of the panel
    ModelSummary,
    /// Mention-frequency fallback over the panel's own lists
    PanelFrequency,
}

/// Aggregate for a free-form stimulus; scores are 0..=100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusAggregate {
    pub pressure_score: u8,
    pub gut_attraction_index: u8,
    pub credibility_score: u8,
    pub avg_purchase_intent: f64,
    pub avg_credibility: f64,
    pub insights: StimulusInsights,
    pub insight_source: InsightSource,
    pub response_count: usize,
}

/// Per-headline tallies. `index` is the 1-based submission position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineRanking {
    pub index: usize,
    pub headline: String,
    pub avg_score: f64,
    pub top_picks: usize,
    pub bottom_picks: usize,
    pub winner_picks: usize,
    pub rating_count: usize,
}

/// Agreement strength on the tournament winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consensus {
    Strong,
    Moderate,
    Weak,
}

impl Consensus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Consensus::Strong => "strong",
            Consensus::Moderate => "moderate",
            Consensus::Weak => "weak",
        }
    }
}

/// What one archetype segment favoured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentInsight {
    pub archetype_name: String,
    pub persona_name: String,
    pub top_pick_index: usize,
    pub top_pick_headline: String,
    pub rationale: String,
}

/// Which part of a response a highlight quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    TopPick,
    BottomPick,
    GutReaction,
}

/// A short quote attributed to one persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerbatimHighlight {
    pub persona_name: String,
    pub archetype_name: String,
    pub kind: HighlightKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline_index: Option<usize>,
    pub quote: String,
}

/// Aggregate for a headline tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineAggregate {
    /// Sorted by `avg_score` descending, ties in submission order
    pub rankings: Vec<HeadlineRanking>,
    pub winner: HeadlineRanking,
    pub margin: f64,
    pub consensus: Consensus,
    pub total_responses: usize,
    pub segment_insights: Vec<SegmentInsight>,
    pub verbatim_highlights: Vec<VerbatimHighlight>,
}

/// Result stored for a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregatedResult {
    Stimulus(StimulusAggregate),
    Headline(HeadlineAggregate),
}
