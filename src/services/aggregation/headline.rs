//! Headline Tournament Aggregator
//!
//! Tallies picks and ratings per headline, ranks headlines by average score,
//! classifies consensus on the winner and pulls segment insights and
//! verbatim highlights from the panel.

use std::collections::HashSet;

use rand::Rng;

use crate::models::{
    Consensus, EvaluationPayload, HeadlineAggregate, HeadlineEvaluation, HeadlineRanking,
    HighlightKind, PersonaResponse, SegmentInsight, VerbatimHighlight,
};
use crate::utils::error::{PanelError, PanelResult};

/// Chance a highlight quotes the top-pick rationale rather than the bottom pick.
pub const TOP_PICK_HIGHLIGHT_WEIGHT: f64 = 0.6;

pub const STRONG_WINNER_SHARE: f64 = 0.5;
pub const STRONG_MARGIN: f64 = 1.0;
pub const MODERATE_WINNER_SHARE: f64 = 0.25;
pub const MODERATE_MARGIN: f64 = 0.5;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Consensus class for the winner's pick share and score margin.
pub fn classify_consensus(winner_picks: usize, total_responses: usize, margin: f64) -> Consensus {
    let share = if total_responses == 0 {
        0.0
    } else {
        winner_picks as f64 / total_responses as f64
    };

    if share >= STRONG_WINNER_SHARE && margin >= STRONG_MARGIN {
        Consensus::Strong
    } else if share >= MODERATE_WINNER_SHARE || margin >= MODERATE_MARGIN {
        Consensus::Moderate
    } else {
        Consensus::Weak
    }
}

/// Per-headline tallies in submission order (index `i` is headline `i + 1`).
pub fn tally_headlines(
    headlines: &[String],
    evaluations: &[&HeadlineEvaluation],
) -> Vec<HeadlineRanking> {
    let count = headlines.len();
    let mut sums = vec![0u32; count];
    let mut rankings: Vec<HeadlineRanking> = headlines
        .iter()
        .enumerate()
        .map(|(i, headline)| HeadlineRanking {
            index: i + 1,
            headline: headline.clone(),
            avg_score: 0.0,
            top_picks: 0,
            bottom_picks: 0,
            winner_picks: 0,
            rating_count: 0,
        })
        .collect();

    // Indices outside 1..=count are ignored; validated responses never carry them.
    let slot = |index: usize| index.checked_sub(1).filter(|i| *i < count);

    for eval in evaluations {
        for pick in &eval.top_3 {
            if let Some(i) = slot(pick.headline_index) {
                rankings[i].top_picks += 1;
            }
        }
        for pick in &eval.bottom_3 {
            if let Some(i) = slot(pick.headline_index) {
                rankings[i].bottom_picks += 1;
            }
        }
        for rating in &eval.all_ratings {
            if let Some(i) = slot(rating.headline_index) {
                sums[i] += rating.score as u32;
                rankings[i].rating_count += 1;
            }
        }
        if let Some(i) = slot(eval.overall_winner) {
            rankings[i].winner_picks += 1;
        }
    }

    for (ranking, sum) in rankings.iter_mut().zip(sums) {
        if ranking.rating_count > 0 {
            ranking.avg_score = round1(sum as f64 / ranking.rating_count as f64);
        }
    }

    rankings
}

/// Sort by average score, highest first. Stable, so ties stay in submission order.
pub fn rank(mut tallies: Vec<HeadlineRanking>) -> Vec<HeadlineRanking> {
    tallies.sort_by(|a, b| b.avg_score.total_cmp(&a.avg_score));
    tallies
}

/// Aggregate a headline tournament.
pub fn aggregate_headlines<R: Rng + ?Sized>(
    headlines: &[String],
    responses: &[PersonaResponse],
    highlight_limit: usize,
    rng: &mut R,
) -> PanelResult<HeadlineAggregate> {
    let panel: Vec<(&PersonaResponse, &HeadlineEvaluation)> = responses
        .iter()
        .filter_map(|r| match &r.evaluation {
            EvaluationPayload::Headline(eval) => Some((r, eval)),
            EvaluationPayload::Stimulus(_) => None,
        })
        .collect();

    let evaluations: Vec<&HeadlineEvaluation> = panel.iter().map(|(_, e)| *e).collect();
    let rankings = rank(tally_headlines(headlines, &evaluations));

    let winner = rankings
        .first()
        .cloned()
        .ok_or_else(|| PanelError::internal("cannot rank an empty headline list"))?;
    let margin = match rankings.get(1) {
        Some(runner_up) => round1(winner.avg_score - runner_up.avg_score),
        None => winner.avg_score,
    };

    let total_responses = panel.len();
    let consensus = classify_consensus(winner.winner_picks, total_responses, margin);

    Ok(HeadlineAggregate {
        segment_insights: segment_insights(headlines, &panel),
        verbatim_highlights: verbatim_highlights(&panel, highlight_limit, rng),
        rankings,
        winner,
        margin,
        consensus,
        total_responses,
    })
}

/// One insight per archetype, from the first response seen for it.
fn segment_insights(
    headlines: &[String],
    panel: &[(&PersonaResponse, &HeadlineEvaluation)],
) -> Vec<SegmentInsight> {
    let mut seen = HashSet::new();
    let mut insights = Vec::new();

    for (response, eval) in panel {
        if !seen.insert(response.archetype_name.as_str()) {
            continue;
        }
        let Some(top) = eval.top_3.first() else {
            continue;
        };
        insights.push(SegmentInsight {
            archetype_name: response.archetype_name.clone(),
            persona_name: response.persona_name.clone(),
            top_pick_index: top.headline_index,
            top_pick_headline: headlines
                .get(top.headline_index.wrapping_sub(1))
                .cloned()
                .unwrap_or_default(),
            rationale: top.why_it_works.clone(),
        });
    }

    insights
}

/// Up to `limit` quotes in panel order.
fn verbatim_highlights<R: Rng + ?Sized>(
    panel: &[(&PersonaResponse, &HeadlineEvaluation)],
    limit: usize,
    rng: &mut R,
) -> Vec<VerbatimHighlight> {
    panel
        .iter()
        .take(limit)
        .map(|(response, eval)| {
            let prefer_top = rng.gen_bool(TOP_PICK_HIGHLIGHT_WEIGHT);
            let picked = if prefer_top {
                eval.top_3
                    .first()
                    .map(|p| (HighlightKind::TopPick, p.headline_index, &p.why_it_works))
            } else {
                eval.bottom_3
                    .first()
                    .map(|p| (HighlightKind::BottomPick, p.headline_index, &p.why_it_fails))
            };

            let (kind, headline_index, quote) = match picked {
                Some((kind, index, quote)) => (kind, Some(index), quote.clone()),
                None => (HighlightKind::GutReaction, None, eval.gut_reaction.clone()),
            };

            VerbatimHighlight {
                persona_name: response.persona_name.clone(),
                archetype_name: response.archetype_name.clone(),
                kind,
                headline_index,
                quote,
            }
        })
        .collect()
}
