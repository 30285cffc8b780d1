//! Orchestrator Integration Tests
//!
//! Runs whole tests against an in-memory SQLite store and a scripted model:
//! pre-start rejections, partial panel failure, retry temperatures, usage
//! accounting, cancellation and the run timeout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use focus_panel::models::{AggregatedResult, EvaluationPayload, InsightSource, InterventionKind, RunHeadline};
use focus_panel::services::generation::{CompletionOptions, GenerationClient, GenerationOutput};
use focus_panel::services::orchestrator::CANCELLED_MESSAGE;
use focus_panel::services::{OrchestratorSettings, RateLimiter, TestOrchestrator};
use focus_panel::storage::Store;
use focus_panel::{PanelError, TestStatus};
use focus_panel_llm::{LlmResult, UsageStats};
use tokio_util::sync::CancellationToken;

use crate::support::*;

fn assert_temperatures(provider: &MockLlmProvider, expected: &[f32]) {
    let seen = provider.temperatures.lock().unwrap().clone();
    assert_eq!(seen.len(), expected.len(), "temperatures: {:?}", seen);
    for (actual, expected) in seen.iter().zip(expected) {
        let actual = actual.expect("temperature override should be set");
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {} got {}",
            expected,
            actual
        );
    }
}

// ============================================================================
// Pre-start rejections
// ============================================================================

#[tokio::test]
async fn test_unknown_test_is_not_found_without_writes() {
    let store = Arc::new(RecordingStore::new());
    let provider = Arc::new(MockLlmProvider::with_texts(vec![]));
    let orchestrator = orchestrator(store.clone(), provider.clone(), settings());

    let err = orchestrator.run_test("missing").await.unwrap_err();

    assert!(matches!(err.root_cause(), PanelError::NotFound(_)));
    assert!(err.is_pre_start());
    assert!(store.writes().is_empty());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_running_test_is_rejected_without_writes() {
    let store = Arc::new(RecordingStore::new());
    seed_test(&store.inner, "t-1", headline_stimulus(3), 2).await;
    store
        .inner
        .set_test_status("t-1", focus_panel::models::StatusUpdate::running(chrono::Utc::now()))
        .await
        .unwrap();

    let provider = Arc::new(MockLlmProvider::with_texts(vec![]));
    let orchestrator = orchestrator(store.clone(), provider.clone(), settings());

    let err = orchestrator.run_test("t-1").await.unwrap_err();

    assert!(matches!(err.root_cause(), PanelError::InvalidState(_)));
    assert!(err.is_pre_start());
    assert!(store.writes().is_empty());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_missing_archetype_leaves_test_in_draft() {
    let store = Arc::new(RecordingStore::new());
    let run = focus_panel::models::TestRun::draft(
        "t-1",
        focus_panel::models::TestConfig {
            stimulus: headline_stimulus(3),
            archetype_ids: vec!["ghost".to_string()],
            calibration: Default::default(),
            category: String::new(),
        },
    );
    store.inner.create_test_run(&run).await.unwrap();

    let provider = Arc::new(MockLlmProvider::with_texts(vec![]));
    let orchestrator = orchestrator(store.clone(), provider.clone(), settings());

    let err = orchestrator.run_test("t-1").await.unwrap_err();

    assert!(matches!(err.root_cause(), PanelError::NotFound(_)));
    assert!(err.is_pre_start());
    assert!(store.writes().is_empty());
    let stored = store.inner.get_test_run("t-1").await.unwrap();
    assert_eq!(stored.status, TestStatus::Draft);
    assert!(stored.started_at.is_none());
}

// ============================================================================
// Panel outcomes
// ============================================================================

#[tokio::test]
async fn test_too_few_successes_fails_the_run() {
    let store = Arc::new(RecordingStore::new());
    seed_test(&store.inner, "t-1", text_stimulus("Dinner in ten minutes", &[]), 5).await;

    let mut texts = vec![stimulus_answer("Looks handy.", 7, 6)];
    texts.extend(std::iter::repeat_with(malformed_answer).take(8));
    let provider = Arc::new(MockLlmProvider::with_texts(texts));
    let orchestrator = orchestrator(store.clone(), provider.clone(), settings());

    let err = orchestrator.run_test("t-1").await.unwrap_err();

    assert!(matches!(
        err,
        PanelError::InsufficientResponses {
            succeeded: 1,
            required: 2
        }
    ));
    assert_eq!(provider.call_count(), 9);
    assert_eq!(store.writes(), vec!["status:running", "status:failed"]);

    let stored = store.inner.get_test_run("t-1").await.unwrap();
    assert_eq!(stored.status, TestStatus::Failed);
    assert!(stored.started_at.is_some());
    assert!(stored.completed_at.is_some());
    assert!(stored
        .error_message
        .unwrap()
        .contains("1 succeeded, 2 required"));
    assert!(store.inner.list_persona_responses("t-1").await.unwrap().is_empty());
    assert!(store.inner.get_aggregated_result("t-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_stimulus_run_completes_with_retries_and_summary() {
    let store = Arc::new(RecordingStore::new());
    let stimulus = text_stimulus(
        "FreshBox: so fresh it was picked this morning.",
        &["fresh means picked this morning"],
    );
    seed_test(&store.inner, "t-1", stimulus, 3).await;

    let provider = Arc::new(MockLlmProvider::with_texts(vec![
        // persona 1: valid at once, reads the freshness claim literally
        stimulus_answer("So the veg was literally picked this morning? Nice.", 8, 7),
        // persona 2: retried once
        malformed_answer(),
        stimulus_answer("I love how quick it sounds.", 6, 5),
        // persona 3: gives up after the retry
        malformed_answer(),
        malformed_answer(),
        // panel summary
        summary_answer(),
    ]));
    let orchestrator = orchestrator(store.clone(), provider.clone(), settings());

    let summary = orchestrator.run_test("t-1").await.unwrap();

    assert_temperatures(&provider, &[0.7, 0.7, 0.8, 0.7, 0.8, 0.3]);
    assert_eq!(summary.status, TestStatus::Completed);
    assert_eq!(summary.response_count, 2);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.response_count + summary.failed_count, 3);
    assert_eq!(
        summary.usage,
        UsageStats {
            input_tokens: 600,
            output_tokens: 120
        }
    );
    assert_eq!(
        summary.summary,
        RunHeadline::Scores {
            pressure_score: 60,
            gut_attraction_index: 67,
            credibility_score: 56,
        }
    );

    assert_eq!(
        store.writes(),
        vec![
            "status:running",
            "aggregate",
            "responses:2",
            "status:completed"
        ]
    );

    let responses = store.inner.list_persona_responses("t-1").await.unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].archetype_id, "a1");
    assert_eq!(responses[0].attempts, 1);
    assert_eq!(
        responses[0].moderator_flag,
        Some(InterventionKind::LiteralInterpretation)
    );
    assert_eq!(responses[1].archetype_id, "a2");
    assert_eq!(responses[1].attempts, 2);
    assert_eq!(
        responses[1].moderator_flag,
        Some(InterventionKind::EmotionalExploration)
    );
    assert!(matches!(
        responses[1].evaluation,
        EvaluationPayload::Stimulus(ref e) if e.purchase_intent == 6
    ));

    match store.inner.get_aggregated_result("t-1").await.unwrap() {
        Some(AggregatedResult::Stimulus(aggregate)) => {
            assert_eq!(aggregate.insight_source, InsightSource::ModelSummary);
            assert_eq!(aggregate.response_count, 2);
            assert_eq!(aggregate.insights.strengths[0].point, "Fresh ingredients");
        }
        other => panic!("unexpected aggregate: {:?}", other),
    }

    let stored = store.inner.get_test_run("t-1").await.unwrap();
    assert_eq!(stored.status, TestStatus::Completed);
    assert!(stored.started_at.is_some());
    assert!(stored.completed_at.is_some());
    assert!(stored.error_message.is_none());
}

#[tokio::test]
async fn test_unusable_summary_falls_back_to_mention_frequency() {
    let store = Arc::new(RecordingStore::new());
    seed_test(&store.inner, "t-1", text_stimulus("Dinner in ten minutes", &[]), 2).await;

    let provider = Arc::new(MockLlmProvider::with_texts(vec![
        stimulus_answer("Handy.", 7, 6),
        stimulus_answer("Seems fine.", 5, 6),
        malformed_answer(),
        malformed_answer(),
    ]));
    let orchestrator = orchestrator(store.clone(), provider.clone(), settings());

    let summary = orchestrator.run_test("t-1").await.unwrap();
    assert_eq!(summary.status, TestStatus::Completed);
    assert_eq!(provider.remaining(), 0);

    match store.inner.get_aggregated_result("t-1").await.unwrap() {
        Some(AggregatedResult::Stimulus(aggregate)) => {
            assert_eq!(aggregate.insight_source, InsightSource::PanelFrequency);
            assert_eq!(aggregate.insights.strengths[0].point, "fresh ingredients");
            assert_eq!(aggregate.insights.weaknesses[0].point, "price");
        }
        other => panic!("unexpected aggregate: {:?}", other),
    }
}

#[tokio::test]
async fn test_completed_test_cannot_run_again() {
    let store = Arc::new(RecordingStore::new());
    seed_test(&store.inner, "t-1", headline_stimulus(3), 2).await;

    let provider = Arc::new(MockLlmProvider::with_texts(vec![
        headline_answer(&[6, 9, 4], 2),
        headline_answer(&[7, 8, 3], 2),
    ]));
    let orchestrator = orchestrator(store.clone(), provider.clone(), settings());

    orchestrator.run_test("t-1").await.unwrap();
    let writes_after_first = store.writes().len();

    let err = orchestrator.run_test("t-1").await.unwrap_err();
    assert!(matches!(err.root_cause(), PanelError::InvalidState(_)));
    assert!(err.is_pre_start());
    assert_eq!(store.writes().len(), writes_after_first);
}

#[tokio::test]
async fn test_concurrent_starts_run_the_test_once() {
    let store = Arc::new(RecordingStore::yielding());
    seed_test(&store.inner, "t-1", headline_stimulus(3), 2).await;

    let provider = Arc::new(MockLlmProvider::with_texts(vec![
        headline_answer(&[6, 9, 4], 2),
        headline_answer(&[7, 8, 3], 2),
    ]));
    let orchestrator = orchestrator(store.clone(), provider.clone(), settings());

    let (first, second) = tokio::join!(orchestrator.run_test("t-1"), orchestrator.run_test("t-1"));

    let (completed, rejected): (Vec<_>, Vec<_>) = [first, second].into_iter().partition(|r| r.is_ok());
    assert_eq!(completed.len(), 1);
    assert_eq!(rejected.len(), 1);
    let err = rejected.into_iter().next().unwrap().unwrap_err();
    assert!(matches!(err.root_cause(), PanelError::InvalidState(_)));
    assert!(err.is_pre_start());

    assert_eq!(provider.call_count(), 2);
    assert_eq!(
        store.writes(),
        vec![
            "status:running",
            "aggregate",
            "responses:2",
            "status:completed"
        ]
    );
    let stored = store.inner.get_test_run("t-1").await.unwrap();
    assert_eq!(stored.status, TestStatus::Completed);
}

// ============================================================================
// Cancellation and timeout
// ============================================================================

/// Cancels the run's token on first use, then never answers.
struct HangingClient {
    token: Option<CancellationToken>,
}

#[async_trait]
impl GenerationClient for HangingClient {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> LlmResult<GenerationOutput> {
        if let Some(token) = &self.token {
            token.cancel();
        }
        tokio::time::sleep(Duration::from_secs(30)).await;
        unreachable!("the run should have stopped waiting")
    }
}

fn hanging_orchestrator(
    store: Arc<RecordingStore>,
    token: Option<CancellationToken>,
    settings: OrchestratorSettings,
) -> TestOrchestrator {
    TestOrchestrator::new(
        store,
        Arc::new(HangingClient { token }),
        RateLimiter::unthrottled(),
        settings,
    )
}

#[tokio::test]
async fn test_cancelled_before_start_writes_nothing() {
    let store = Arc::new(RecordingStore::new());
    seed_test(&store.inner, "t-1", headline_stimulus(3), 2).await;
    let provider = Arc::new(MockLlmProvider::with_texts(vec![]));
    let orchestrator = orchestrator(store.clone(), provider.clone(), settings());

    let token = CancellationToken::new();
    token.cancel();
    let err = orchestrator
        .run_test_with_cancellation("t-1", token)
        .await
        .unwrap_err();

    assert!(matches!(err.root_cause(), PanelError::Cancelled(_)));
    assert!(err.is_pre_start());
    assert!(store.writes().is_empty());
    assert_eq!(provider.call_count(), 0);
    let stored = store.inner.get_test_run("t-1").await.unwrap();
    assert_eq!(stored.status, TestStatus::Draft);
}

#[tokio::test]
async fn test_cancellation_mid_panel_fails_the_run() {
    let store = Arc::new(RecordingStore::new());
    seed_test(&store.inner, "t-1", headline_stimulus(3), 3).await;

    let token = CancellationToken::new();
    let orchestrator = hanging_orchestrator(store.clone(), Some(token.clone()), settings());

    let err = orchestrator
        .run_test_with_cancellation("t-1", token)
        .await
        .unwrap_err();

    assert!(matches!(err, PanelError::Cancelled(_)));
    assert!(!err.is_pre_start());
    assert_eq!(store.writes(), vec!["status:running", "status:failed"]);
    let stored = store.inner.get_test_run("t-1").await.unwrap();
    assert_eq!(stored.status, TestStatus::Failed);
    assert_eq!(stored.error_message.as_deref(), Some(CANCELLED_MESSAGE));
    assert!(store.inner.list_persona_responses("t-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_timeout_cancels_the_run() {
    let store = Arc::new(RecordingStore::new());
    seed_test(&store.inner, "t-1", headline_stimulus(3), 2).await;

    let settings = OrchestratorSettings {
        run_timeout: Some(Duration::from_millis(50)),
        ..settings()
    };
    let orchestrator = hanging_orchestrator(store.clone(), None, settings);

    let err = orchestrator.run_test("t-1").await.unwrap_err();

    match err {
        PanelError::Cancelled(message) => assert!(message.contains("timed out")),
        other => panic!("expected a timeout, got {:?}", other),
    }
    let stored = store.inner.get_test_run("t-1").await.unwrap();
    assert_eq!(stored.status, TestStatus::Failed);
    assert_eq!(stored.error_message.as_deref(), Some(CANCELLED_MESSAGE));
}
