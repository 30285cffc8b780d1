//! Headline Tournament Integration Tests
//!
//! End-to-end tournaments through the orchestrator, plus properties of the
//! ranking and validator that only show up across a whole panel.

use std::sync::Arc;

use focus_panel::models::{AggregatedResult, Consensus, HeadlineAggregate, RunHeadline};
use focus_panel::services::aggregation::classify_consensus;
use focus_panel::services::generation::validate_headline_evaluation;
use focus_panel::TestStatus;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::support::*;

async fn stored_aggregate(store: &RecordingStore, test_id: &str) -> HeadlineAggregate {
    use focus_panel::storage::Store;
    match store.inner.get_aggregated_result(test_id).await.unwrap() {
        Some(AggregatedResult::Headline(aggregate)) => aggregate,
        other => panic!("unexpected aggregate: {:?}", other),
    }
}

// ============================================================================
// Unanimous panel
// ============================================================================

#[tokio::test]
async fn test_unanimous_winner_has_strong_consensus() {
    let store = Arc::new(RecordingStore::new());
    seed_test(&store.inner, "t-1", headline_stimulus(3), 4).await;

    let provider = Arc::new(MockLlmProvider::with_texts(
        (0..4).map(|_| headline_answer(&[6, 9, 4], 2)).collect(),
    ));
    let orchestrator = orchestrator(store.clone(), provider.clone(), settings());

    let summary = orchestrator.run_test("t-1").await.unwrap();

    assert_eq!(summary.status, TestStatus::Completed);
    assert_eq!(summary.response_count, 4);
    match summary.summary {
        RunHeadline::Ranking {
            winner_index,
            winner_headline,
            winner_avg_score,
            margin,
            consensus,
        } => {
            assert_eq!(winner_index, 2);
            assert_eq!(winner_headline, "Headline 2");
            assert_eq!(winner_avg_score, 9.0);
            assert_eq!(margin, 3.0);
            assert_eq!(consensus, Consensus::Strong);
        }
        other => panic!("expected a ranking, got {:?}", other),
    }

    let aggregate = stored_aggregate(&store, "t-1").await;
    let order: Vec<usize> = aggregate.rankings.iter().map(|r| r.index).collect();
    assert_eq!(order, vec![2, 1, 3]);
    assert_eq!(aggregate.winner.winner_picks, 4);
    assert_eq!(aggregate.total_responses, 4);
    assert_eq!(aggregate.segment_insights.len(), 4);
    assert!(aggregate
        .segment_insights
        .iter()
        .all(|s| s.top_pick_index == 2));
    assert!(!aggregate.verbatim_highlights.is_empty());
    assert!(aggregate.verbatim_highlights.len() <= settings().highlight_limit);
}

// ============================================================================
// Ranking properties
// ============================================================================

#[tokio::test]
async fn test_rankings_are_non_increasing_for_a_random_panel() {
    let store = Arc::new(RecordingStore::new());
    seed_test(&store.inner, "t-1", headline_stimulus(5), 6).await;

    let mut rng = StdRng::seed_from_u64(42);
    let answers: Vec<String> = (0..6)
        .map(|_| {
            let scores: Vec<u8> = (0..5).map(|_| rng.gen_range(1..=10)).collect();
            let winner = rng.gen_range(1..=5);
            headline_answer(&scores, winner)
        })
        .collect();
    let provider = Arc::new(MockLlmProvider::with_texts(answers));
    let orchestrator = orchestrator(store.clone(), provider.clone(), settings());

    orchestrator.run_test("t-1").await.unwrap();
    let aggregate = stored_aggregate(&store, "t-1").await;

    assert_eq!(aggregate.rankings.len(), 5);
    for pair in aggregate.rankings.windows(2) {
        assert!(pair[0].avg_score >= pair[1].avg_score);
    }
    assert_eq!(aggregate.winner, aggregate.rankings[0]);
    assert!(aggregate.rankings.iter().all(|r| r.rating_count == 6));

    let total_winner_picks: usize = aggregate.rankings.iter().map(|r| r.winner_picks).sum();
    assert_eq!(total_winner_picks, 6);
}

#[test]
fn test_validation_is_idempotent() {
    let raw: serde_json::Value =
        serde_json::from_str(&headline_answer(&[3, 8, 5, 7], 2)).unwrap();
    let first = validate_headline_evaluation(&raw, 4).unwrap();

    let reserialized = serde_json::to_value(&first).unwrap();
    let second = validate_headline_evaluation(&reserialized, 4).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_consensus_boundaries() {
    assert_eq!(classify_consensus(49, 100, 0.6), Consensus::Moderate);
    assert_eq!(classify_consensus(50, 100, 1.0), Consensus::Strong);
    assert_eq!(classify_consensus(50, 100, 0.9), Consensus::Moderate);
    assert_eq!(classify_consensus(1, 10, 0.2), Consensus::Weak);
}
