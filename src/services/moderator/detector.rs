//! Moderator Intervention Detector
//!
//! Stateless heuristic deciding whether a persona's answer deserves a
//! follow-up question. Checks run in priority order and the first match wins:
//! literal interpretation of a known red flag, then hedging, then strong emotion.
//!
//! Red flags and emotion words are compared by stem, so "loved" counts as
//! "love" and "freely" as "free". Red-flag stems of five letters or more also
//! match longer words they start.

use focus_panel_core::keywords::{contains_phrase, content_stems, stem, stem_matches, stem_set};
use serde::{Deserialize, Serialize};

use crate::models::InterventionKind;

/// Content words of one red-flag pattern that must appear for a literal read.
pub const LITERAL_MATCH_THRESHOLD: usize = 2;

pub const HEDGING_PHRASES: &[&str] = &[
    "not sure",
    "maybe",
    "i guess",
    "i suppose",
    "perhaps",
    "kind of",
    "sort of",
    "hard to say",
    "i don't know",
    "no idea",
];

pub const EMOTION_WORDS: &[&str] = &[
    "hate",
    "love",
    "worried",
    "angry",
    "furious",
    "excited",
    "thrilled",
    "scared",
    "afraid",
    "anxious",
    "disgusted",
    "frustrated",
    "annoyed",
    "delighted",
];

/// A detected intervention and what triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intervention {
    pub kind: InterventionKind,
    /// Red-flag pattern, hedging phrase or emotion word that matched
    pub trigger: String,
}

impl Intervention {
    pub fn follow_up_question(&self) -> &'static str {
        follow_up_question(self.kind)
    }
}

/// Follow-up question a moderator could ask for a verdict.
pub fn follow_up_question(kind: InterventionKind) -> &'static str {
    match kind {
        InterventionKind::LiteralInterpretation => {
            "When you read that, what exactly did you think it promised you?"
        }
        InterventionKind::NeedsProbing => {
            "You sound undecided. What would it take to make up your mind either way?"
        }
        InterventionKind::EmotionalExploration => {
            "That's a strong reaction. What is it about this that makes you feel that way?"
        }
    }
}

/// Classify a response, returning the trigger that fired.
pub fn detect(text: &str, red_flag_patterns: &[String]) -> Option<Intervention> {
    let stems = stem_set(text);

    for pattern in red_flag_patterns {
        let hits = content_stems(pattern)
            .iter()
            .filter(|word| stems.iter().any(|token| stem_matches(token, word)))
            .count();
        if hits >= LITERAL_MATCH_THRESHOLD {
            return Some(Intervention {
                kind: InterventionKind::LiteralInterpretation,
                trigger: pattern.clone(),
            });
        }
    }

    if let Some(phrase) = HEDGING_PHRASES.iter().find(|p| contains_phrase(text, p)) {
        return Some(Intervention {
            kind: InterventionKind::NeedsProbing,
            trigger: phrase.to_string(),
        });
    }

    EMOTION_WORDS
        .iter()
        .find(|w| stems.contains(&stem(w)))
        .map(|word| Intervention {
            kind: InterventionKind::EmotionalExploration,
            trigger: word.to_string(),
        })
}

/// Verdict only.
pub fn detect_intervention(text: &str, red_flag_patterns: &[String]) -> Option<InterventionKind> {
    detect(text, red_flag_patterns).map(|i| i.kind)
}
