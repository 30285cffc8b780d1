//! Free-form Stimulus Aggregator
//!
//! Numeric scores use a closed-form rule over the panel's 1..=10 ratings so
//! identical responses always aggregate identically:
//!
//! - `gut_attraction_index = round((mean(purchase_intent) - 1) / 9 * 100)`
//! - `credibility_score = round((mean(credibility_rating) - 1) / 9 * 100)`
//! - `pressure_score = round(0.4 * gut_attraction_index + 0.6 * credibility_score)`
//!
//! Qualitative buckets come from a validated model summary of the panel and
//! fall back to mention frequency over the panel's own lists.

use std::collections::{HashMap, HashSet};

use focus_panel_llm::UsageStats;
use tracing::{info, warn};

use crate::models::{
    Brief, EvaluationPayload, InsightSource, Level, PersonaResponse, Recommendation,
    StimulusAggregate, StimulusEvaluation, StimulusInsights, Strength, Weakness,
};
use crate::services::generation::{
    generate_validated, validate_stimulus_summary, GenerationClient, TaskKind,
};
use crate::services::prompts::build_summary_prompt;
use crate::utils::error::{PanelError, PanelResult};

const GUT_WEIGHT: f64 = 0.4;
const CREDIBILITY_WEIGHT: f64 = 0.6;

/// Entries kept per bucket in the frequency fallback.
pub const FALLBACK_BUCKET_LIMIT: usize = 5;

/// Recommendations derived from the top weaknesses in the fallback.
const FALLBACK_RECOMMENDATIONS: usize = 3;

/// Numeric part of a stimulus aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StimulusScores {
    pub pressure_score: u8,
    pub gut_attraction_index: u8,
    pub credibility_score: u8,
    pub avg_purchase_intent: f64,
    pub avg_credibility: f64,
}

fn stimulus_evaluations(responses: &[PersonaResponse]) -> Vec<&StimulusEvaluation> {
    responses
        .iter()
        .filter_map(|r| match &r.evaluation {
            EvaluationPayload::Stimulus(eval) => Some(eval),
            EvaluationPayload::Headline(_) => None,
        })
        .collect()
}

/// Map a 1..=10 mean onto 0..=100.
fn to_index(mean: f64) -> u8 {
    (((mean - 1.0) / 9.0) * 100.0).round().clamp(0.0, 100.0) as u8
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn compute_scores(evaluations: &[&StimulusEvaluation]) -> PanelResult<StimulusScores> {
    if evaluations.is_empty() {
        return Err(PanelError::internal(
            "cannot score a stimulus without responses",
        ));
    }

    let n = evaluations.len() as f64;
    let mean_intent = evaluations
        .iter()
        .map(|e| e.purchase_intent as f64)
        .sum::<f64>()
        / n;
    let mean_credibility = evaluations
        .iter()
        .map(|e| e.credibility_rating as f64)
        .sum::<f64>()
        / n;

    let gut_attraction_index = to_index(mean_intent);
    let credibility_score = to_index(mean_credibility);
    let pressure_score = (GUT_WEIGHT * gut_attraction_index as f64
        + CREDIBILITY_WEIGHT * credibility_score as f64)
        .round()
        .clamp(0.0, 100.0) as u8;

    Ok(StimulusScores {
        pressure_score,
        gut_attraction_index,
        credibility_score,
        avg_purchase_intent: round1(mean_intent),
        avg_credibility: round1(mean_credibility),
    })
}

/// Level for a mention share of the panel.
fn level_for_share(mentions: usize, total: usize) -> Level {
    let share = mentions as f64 / total.max(1) as f64;
    if share >= 0.5 {
        Level::High
    } else if share >= 0.25 {
        Level::Medium
    } else {
        Level::Low
    }
}

/// Distinct phrases by how many personas mentioned them, most first.
/// Ties keep first-mention order; the first spelling seen is kept.
fn rank_mentions<'a, I>(lists: I) -> Vec<(String, usize)>
where
    I: Iterator<Item = &'a Vec<String>>,
{
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for list in lists {
        let mut seen_in_response = HashSet::new();
        for item in list {
            let key = item.trim().to_lowercase();
            if key.is_empty() || !seen_in_response.insert(key.clone()) {
                continue;
            }
            match index.get(&key) {
                Some(&pos) => order[pos].1 += 1,
                None => {
                    index.insert(key, order.len());
                    order.push((item.trim().to_string(), 1));
                }
            }
        }
    }

    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
}

/// Deterministic buckets built from `what_works` and `concerns`.
pub fn frequency_insights(evaluations: &[&StimulusEvaluation]) -> StimulusInsights {
    let total = evaluations.len();

    let strengths: Vec<Strength> = rank_mentions(evaluations.iter().map(|e| &e.what_works))
        .into_iter()
        .take(FALLBACK_BUCKET_LIMIT)
        .map(|(point, count)| Strength {
            point,
            confidence: level_for_share(count, total),
        })
        .collect();

    let weaknesses: Vec<Weakness> = rank_mentions(evaluations.iter().map(|e| &e.concerns))
        .into_iter()
        .take(FALLBACK_BUCKET_LIMIT)
        .map(|(point, count)| Weakness {
            point,
            severity: level_for_share(count, total),
        })
        .collect();

    let recommendations = weaknesses
        .iter()
        .take(FALLBACK_RECOMMENDATIONS)
        .map(|w| Recommendation {
            action: format!("Address the concern: {}", w.point),
            priority: w.severity,
        })
        .collect();

    StimulusInsights {
        strengths,
        weaknesses,
        recommendations,
    }
}

/// Combine scores with already-resolved insights.
pub fn aggregate_stimulus(
    responses: &[PersonaResponse],
    insights: StimulusInsights,
    insight_source: InsightSource,
) -> PanelResult<StimulusAggregate> {
    let evaluations = stimulus_evaluations(responses);
    let scores = compute_scores(&evaluations)?;

    Ok(StimulusAggregate {
        pressure_score: scores.pressure_score,
        gut_attraction_index: scores.gut_attraction_index,
        credibility_score: scores.credibility_score,
        avg_purchase_intent: scores.avg_purchase_intent,
        avg_credibility: scores.avg_credibility,
        insights,
        insight_source,
        response_count: evaluations.len(),
    })
}

/// Aggregate with a model summary for the qualitative buckets.
///
/// A summary that fails twice is not fatal: the frequency buckets are used
/// instead. Returns the tokens spent on the summary.
pub async fn summarize_stimulus(
    client: &dyn GenerationClient,
    content: &str,
    brief: Option<&Brief>,
    responses: &[PersonaResponse],
) -> PanelResult<(StimulusAggregate, UsageStats)> {
    let prompt = build_summary_prompt(content, brief, responses);

    match generate_validated(
        client,
        TaskKind::StimulusSummary,
        &prompt.system,
        &prompt.user,
        validate_stimulus_summary,
    )
    .await
    {
        Ok(summary) => {
            info!(attempts = summary.attempts, "panel summary validated");
            let aggregate =
                aggregate_stimulus(responses, summary.value, InsightSource::ModelSummary)?;
            Ok((aggregate, summary.usage))
        }
        Err(failed) => {
            warn!(
                error = %failed.error,
                "panel summary unusable, falling back to mention frequency"
            );
            let evaluations = stimulus_evaluations(responses);
            let insights = frequency_insights(&evaluations);
            let aggregate = aggregate_stimulus(responses, insights, InsightSource::PanelFrequency)?;
            Ok((aggregate, failed.usage))
        }
    }
}
