//! Response Validator
//!
//! Schema checks for parsed model output. Each validator is a pure function
//! from a JSON value to either the typed payload or every violation found,
//! so failures can be enumerated and tested without a model in the loop.

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{
    BottomPick, HeadlineEvaluation, HeadlineRating, Level, Recommendation, StimulusEvaluation,
    StimulusInsights, Strength, TopPick, Weakness,
};

/// Picks required per list in a headline tournament (fewer when there are
/// fewer headlines).
pub const REQUIRED_PICKS: usize = 3;

pub const SCORE_MIN: i64 = 1;
pub const SCORE_MAX: i64 = 10;

/// One way a parsed response breaks its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` should be {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("field `{0}` is empty")]
    EmptyText(String),

    #[error("field `{field}` is {value}, expected {min}..={max}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("field `{field}` has {actual} entries, expected {expected}")]
    WrongLength {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("field `{field}` repeats headline {index}")]
    DuplicateIndex { field: String, index: i64 },

    #[error("no rating for headline {0}")]
    MissingRating(usize),

    #[error("field `{field}` has unknown level '{value}'")]
    InvalidLevel { field: String, value: String },
}

/// Validate a headline-tournament response for `headline_count` headlines.
pub fn validate_headline_evaluation(
    value: &Value,
    headline_count: usize,
) -> Result<HeadlineEvaluation, Vec<SchemaViolation>> {
    let obj = value.as_object().ok_or_else(|| vec![SchemaViolation::NotAnObject])?;
    let mut violations = Vec::new();
    let max_index = headline_count as i64;
    let picks = headline_count.min(REQUIRED_PICKS);

    let top_3 = pick_list(obj, "top_3", "why_it_works", picks, max_index, &mut violations)
        .into_iter()
        .map(|(headline_index, why_it_works)| TopPick {
            headline_index,
            why_it_works,
        })
        .collect();

    let bottom_3 = pick_list(obj, "bottom_3", "why_it_fails", picks, max_index, &mut violations)
        .into_iter()
        .map(|(headline_index, why_it_fails)| BottomPick {
            headline_index,
            why_it_fails,
        })
        .collect();

    let all_ratings = rating_list(obj, headline_count, &mut violations);

    let overall_winner = required(obj, "overall_winner", &mut violations)
        .and_then(|v| integer(v, "overall_winner", 1, max_index, &mut violations))
        .map(|i| i as usize);

    let gut_reaction = required(obj, "gut_reaction", &mut violations)
        .and_then(|v| text(v, "gut_reaction", &mut violations));

    match (overall_winner, gut_reaction) {
        (Some(overall_winner), Some(gut_reaction)) if violations.is_empty() => {
            Ok(HeadlineEvaluation {
                top_3,
                bottom_3,
                all_ratings,
                overall_winner,
                gut_reaction,
            })
        }
        _ => Err(violations),
    }
}

/// Boolean form of [`validate_headline_evaluation`].
pub fn is_valid_headline_evaluation(value: &Value, headline_count: usize) -> bool {
    validate_headline_evaluation(value, headline_count).is_ok()
}

/// Validate a persona's reaction to a free-form stimulus.
pub fn validate_stimulus_evaluation(
    value: &Value,
) -> Result<StimulusEvaluation, Vec<SchemaViolation>> {
    let obj = value.as_object().ok_or_else(|| vec![SchemaViolation::NotAnObject])?;
    let mut violations = Vec::new();

    let gut_reaction = required(obj, "gut_reaction", &mut violations)
        .and_then(|v| text(v, "gut_reaction", &mut violations));

    let emotional_response = required(obj, "emotional_response", &mut violations).and_then(|v| {
        v.as_str().map(|s| s.trim().to_string()).or_else(|| {
            violations.push(wrong_type("emotional_response", "a string"));
            None
        })
    });

    let purchase_intent = required(obj, "purchase_intent", &mut violations)
        .and_then(|v| integer(v, "purchase_intent", SCORE_MIN, SCORE_MAX, &mut violations));

    let credibility_rating = required(obj, "credibility_rating", &mut violations)
        .and_then(|v| integer(v, "credibility_rating", SCORE_MIN, SCORE_MAX, &mut violations));

    let what_works = required(obj, "what_works", &mut violations)
        .and_then(|v| string_list(v, "what_works", &mut violations));

    let concerns = required(obj, "concerns", &mut violations)
        .and_then(|v| string_list(v, "concerns", &mut violations));

    match (
        gut_reaction,
        emotional_response,
        purchase_intent,
        credibility_rating,
        what_works,
        concerns,
    ) {
        (
            Some(gut_reaction),
            Some(emotional_response),
            Some(purchase_intent),
            Some(credibility_rating),
            Some(what_works),
            Some(concerns),
        ) if violations.is_empty() => Ok(StimulusEvaluation {
            gut_reaction,
            emotional_response,
            purchase_intent: purchase_intent as u8,
            credibility_rating: credibility_rating as u8,
            what_works,
            concerns,
        }),
        _ => Err(violations),
    }
}

/// Validate the panel summary used for stimulus qualitative buckets.
pub fn validate_stimulus_summary(value: &Value) -> Result<StimulusInsights, Vec<SchemaViolation>> {
    let obj = value.as_object().ok_or_else(|| vec![SchemaViolation::NotAnObject])?;
    let mut violations = Vec::new();

    let strengths = tagged_list(obj, "strengths", "point", "confidence", &mut violations)
        .into_iter()
        .map(|(point, confidence)| Strength { point, confidence })
        .collect();
    let weaknesses = tagged_list(obj, "weaknesses", "point", "severity", &mut violations)
        .into_iter()
        .map(|(point, severity)| Weakness { point, severity })
        .collect();
    let recommendations = tagged_list(obj, "recommendations", "action", "priority", &mut violations)
        .into_iter()
        .map(|(action, priority)| Recommendation { action, priority })
        .collect();

    if violations.is_empty() {
        Ok(StimulusInsights {
            strengths,
            weaknesses,
            recommendations,
        })
    } else {
        Err(violations)
    }
}

fn wrong_type(field: &str, expected: &'static str) -> SchemaViolation {
    SchemaViolation::WrongType {
        field: field.to_string(),
        expected,
    }
}

/// Present and non-null field, recording `MissingField` otherwise.
fn required<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    violations: &mut Vec<SchemaViolation>,
) -> Option<&'a Value> {
    match obj.get(field) {
        Some(Value::Null) | None => {
            violations.push(SchemaViolation::MissingField(field.to_string()));
            None
        }
        Some(value) => Some(value),
    }
}

/// Integer in `min..=max`. Whole-valued floats such as `8.0` are accepted.
fn integer(
    value: &Value,
    field: &str,
    min: i64,
    max: i64,
    violations: &mut Vec<SchemaViolation>,
) -> Option<i64> {
    let number = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64));

    let Some(number) = number else {
        violations.push(wrong_type(field, "an integer"));
        return None;
    };

    if number < min || number > max {
        violations.push(SchemaViolation::OutOfRange {
            field: field.to_string(),
            value: number,
            min,
            max,
        });
        return None;
    }

    Some(number)
}

/// Non-blank string, trimmed.
fn text(value: &Value, field: &str, violations: &mut Vec<SchemaViolation>) -> Option<String> {
    match value.as_str() {
        Some(s) if s.trim().is_empty() => {
            violations.push(SchemaViolation::EmptyText(field.to_string()));
            None
        }
        Some(s) => Some(s.trim().to_string()),
        None => {
            violations.push(wrong_type(field, "a string"));
            None
        }
    }
}

/// Array of strings; blank entries are dropped.
fn string_list(
    value: &Value,
    field: &str,
    violations: &mut Vec<SchemaViolation>,
) -> Option<Vec<String>> {
    let Some(items) = value.as_array() else {
        violations.push(wrong_type(field, "an array of strings"));
        return None;
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
            Some(_) => {}
            None => violations.push(wrong_type(&format!("{}[{}]", field, i), "a string")),
        }
    }
    Some(out)
}

fn array_of<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    violations: &mut Vec<SchemaViolation>,
) -> Option<&'a Vec<Value>> {
    let value = required(obj, field, violations)?;
    let items = value.as_array();
    if items.is_none() {
        violations.push(wrong_type(field, "an array"));
    }
    items
}

/// `[{headline_index, <rationale_key>}]` of exactly `expected` distinct picks.
fn pick_list(
    obj: &Map<String, Value>,
    field: &str,
    rationale_key: &str,
    expected: usize,
    max_index: i64,
    violations: &mut Vec<SchemaViolation>,
) -> Vec<(usize, String)> {
    let Some(items) = array_of(obj, field, violations) else {
        return Vec::new();
    };

    if items.len() != expected {
        violations.push(SchemaViolation::WrongLength {
            field: field.to_string(),
            expected,
            actual: items.len(),
        });
    }

    let mut seen = HashSet::new();
    let mut picks = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("{}[{}]", field, i);
        let Some(entry) = item.as_object() else {
            violations.push(wrong_type(&path, "an object"));
            continue;
        };

        let index = required(entry, "headline_index", violations)
            .and_then(|v| integer(v, &format!("{}.headline_index", path), 1, max_index, violations));
        let rationale = required(entry, rationale_key, violations)
            .and_then(|v| text(v, &format!("{}.{}", path, rationale_key), violations));

        if let Some(index) = index {
            if !seen.insert(index) {
                violations.push(SchemaViolation::DuplicateIndex {
                    field: field.to_string(),
                    index,
                });
            }
            if let Some(rationale) = rationale {
                picks.push((index as usize, rationale));
            }
        }
    }
    picks
}

/// `[{headline_index, score}]` with exactly one rating per headline.
fn rating_list(
    obj: &Map<String, Value>,
    headline_count: usize,
    violations: &mut Vec<SchemaViolation>,
) -> Vec<HeadlineRating> {
    let Some(items) = array_of(obj, "all_ratings", violations) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut ratings = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("all_ratings[{}]", i);
        let Some(entry) = item.as_object() else {
            violations.push(wrong_type(&path, "an object"));
            continue;
        };

        let index = required(entry, "headline_index", violations).and_then(|v| {
            integer(
                v,
                &format!("{}.headline_index", path),
                1,
                headline_count as i64,
                violations,
            )
        });
        let score = required(entry, "score", violations)
            .and_then(|v| integer(v, &format!("{}.score", path), SCORE_MIN, SCORE_MAX, violations));

        if let Some(index) = index {
            if !seen.insert(index) {
                violations.push(SchemaViolation::DuplicateIndex {
                    field: "all_ratings".to_string(),
                    index,
                });
                continue;
            }
            if let Some(score) = score {
                ratings.push(HeadlineRating {
                    headline_index: index as usize,
                    score: score as u8,
                });
            }
        }
    }

    for index in 1..=headline_count {
        if !seen.contains(&(index as i64)) {
            violations.push(SchemaViolation::MissingRating(index));
        }
    }

    ratings
}

/// `[{<text_key>, <level_key>}]` where the level is high/medium/low.
fn tagged_list(
    obj: &Map<String, Value>,
    field: &str,
    text_key: &str,
    level_key: &str,
    violations: &mut Vec<SchemaViolation>,
) -> Vec<(String, Level)> {
    let Some(items) = array_of(obj, field, violations) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("{}[{}]", field, i);
        let Some(entry) = item.as_object() else {
            violations.push(wrong_type(&path, "an object"));
            continue;
        };

        let body = required(entry, text_key, violations)
            .and_then(|v| text(v, &format!("{}.{}", path, text_key), violations));
        let level = required(entry, level_key, violations).and_then(|v| {
            let label = v.as_str().unwrap_or_default();
            let level = Level::parse(label);
            if level.is_none() {
                violations.push(SchemaViolation::InvalidLevel {
                    field: format!("{}.{}", path, level_key),
                    value: v.to_string().trim_matches('"').to_string(),
                });
            }
            level
        });

        if let (Some(body), Some(level)) = (body, level) {
            out.push((body, level));
        }
    }
    out
}
