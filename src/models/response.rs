//! Persona Response Models
//!
//! Structured per-persona evaluations as produced by the model (after
//! validation), plus the failure marker recorded when a persona gives up.

use chrono::{DateTime, Utc};
use focus_panel_llm::UsageStats;
use serde::{Deserialize, Serialize};

/// Persona reaction to a free-form stimulus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusEvaluation {
    pub gut_reaction: String,
    pub emotional_response: String,
    /// 1..=10
    pub purchase_intent: u8,
    /// 1..=10
    pub credibility_rating: u8,
    pub what_works: Vec<String>,
    pub concerns: Vec<String>,
}

/// One of a persona's top picks. `headline_index` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPick {
    pub headline_index: usize,
    pub why_it_works: String,
}

/// One of a persona's bottom picks. `headline_index` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottomPick {
    pub headline_index: usize,
    pub why_it_fails: String,
}

/// A 1..=10 rating for one headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineRating {
    pub headline_index: usize,
    pub score: u8,
}

/// Persona verdict in a headline tournament; mirrors the wire schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineEvaluation {
    pub top_3: Vec<TopPick>,
    pub bottom_3: Vec<BottomPick>,
    pub all_ratings: Vec<HeadlineRating>,
    /// 1-based
    pub overall_winner: usize,
    pub gut_reaction: String,
}

/// Validated model output for one persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationPayload {
    Stimulus(StimulusEvaluation),
    Headline(HeadlineEvaluation),
}

impl EvaluationPayload {
    /// The persona's free-text gut reaction.
    pub fn narrative(&self) -> &str {
        match self {
            EvaluationPayload::Stimulus(e) => &e.gut_reaction,
            EvaluationPayload::Headline(e) => &e.gut_reaction,
        }
    }
}

/// Moderator follow-up classification for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionKind {
    /// The persona read the copy literally in a way the brief flagged
    LiteralInterpretation,
    /// The persona hedged; a follow-up could surface a firmer opinion
    NeedsProbing,
    /// Strong emotion worth exploring
    EmotionalExploration,
}

impl InterventionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterventionKind::LiteralInterpretation => "literal_interpretation",
            InterventionKind::NeedsProbing => "needs_probing",
            InterventionKind::EmotionalExploration => "emotional_exploration",
        }
    }
}

/// A successful persona response, persisted only when the run completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaResponse {
    pub id: String,
    pub test_id: String,
    pub archetype_id: String,
    pub archetype_name: String,
    pub persona_name: String,
    pub evaluation: EvaluationPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderator_flag: Option<InterventionKind>,
    /// 1 on first-try success, 2 after the retry
    pub attempts: u8,
    pub usage: UsageStats,
    pub created_at: DateTime<Utc>,
}

/// A persona that did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaFailure {
    pub archetype_id: String,
    pub persona_name: String,
    pub reason: String,
    pub attempts: u8,
    pub usage: UsageStats,
}

/// Result of one persona iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum PersonaOutcome {
    Succeeded(PersonaResponse),
    Failed(PersonaFailure),
}

impl PersonaOutcome {
    pub fn usage(&self) -> &UsageStats {
        match self {
            PersonaOutcome::Succeeded(r) => &r.usage,
            PersonaOutcome::Failed(f) => &f.usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_tagged_by_kind() {
        let payload = EvaluationPayload::Stimulus(StimulusEvaluation {
            gut_reaction: "Feels pushy".to_string(),
            emotional_response: "annoyed".to_string(),
            purchase_intent: 3,
            credibility_rating: 4,
            what_works: vec![],
            concerns: vec!["price".to_string()],
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "stimulus");
        assert_eq!(json["purchase_intent"], 3);
        assert_eq!(payload.narrative(), "Feels pushy");
    }

    #[test]
    fn test_intervention_kind_labels() {
        assert_eq!(
            serde_json::to_string(&InterventionKind::NeedsProbing).unwrap(),
            "\"needs_probing\""
        );
        assert_eq!(
            InterventionKind::LiteralInterpretation.as_str(),
            "literal_interpretation"
        );
    }
}
