//! Shared fixtures for integration tests: a scripted LLM provider, a store
//! wrapper that records writes, and JSON builders for persona answers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use focus_panel::models::{
    AggregatedResult, Archetype, ArchetypeMemory, Calibration, PersonaResponse, Psychographics,
    StatusUpdate, Stimulus, TestConfig, TestRun,
};
use focus_panel::services::generation::LlmGenerationClient;
use focus_panel::services::{OrchestratorSettings, RateLimiter, TestOrchestrator};
use focus_panel::storage::{SqliteStore, Store};
use focus_panel::PanelResult;
use focus_panel_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
    StopReason, UsageStats,
};
use serde_json::json;

// ============================================================================
// Mock provider
// ============================================================================

/// Pops scripted responses in order and records the temperature of each call.
pub struct MockLlmProvider {
    config: ProviderConfig,
    responses: Mutex<Vec<LlmResult<LlmResponse>>>,
    pub temperatures: Mutex<Vec<Option<f32>>>,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<LlmResult<LlmResponse>>) -> Self {
        Self {
            config: ProviderConfig::default(),
            responses: Mutex::new(responses),
            temperatures: Mutex::new(Vec::new()),
        }
    }

    pub fn with_texts(texts: Vec<String>) -> Self {
        Self::new(texts.into_iter().map(text_response).collect())
    }

    pub fn call_count(&self) -> usize {
        self.temperatures.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

pub fn text_response(text: String) -> LlmResult<LlmResponse> {
    Ok(LlmResponse {
        content: Some(text),
        stop_reason: StopReason::EndTurn,
        usage: UsageStats {
            input_tokens: 100,
            output_tokens: 20,
        },
        model: "mock-model".to_string(),
    })
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn send_message(
        &self,
        _messages: Vec<Message>,
        _system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.temperatures
            .lock()
            .unwrap()
            .push(request_options.temperature_override);

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(LlmError::Other {
                message: "No more mock responses".to_string(),
            })
        } else {
            responses.remove(0)
        }
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

// ============================================================================
// Recording store
// ============================================================================

/// Delegates to an in-memory [`SqliteStore`] and records every accepted write.
pub struct RecordingStore {
    pub inner: SqliteStore,
    pub writes: Mutex<Vec<String>>,
    yield_reads: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::new_in_memory().unwrap(),
            writes: Mutex::new(Vec::new()),
            yield_reads: false,
        }
    }

    /// Yields to the runtime on every test read so concurrent runs interleave.
    pub fn yielding() -> Self {
        Self {
            yield_reads: true,
            ..Self::new()
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    fn record(&self, result: PanelResult<()>, what: String) -> PanelResult<()> {
        if result.is_ok() {
            self.writes.lock().unwrap().push(what);
        }
        result
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn get_archetype(&self, id: &str) -> PanelResult<Archetype> {
        self.inner.get_archetype(id).await
    }

    async fn get_test_run(&self, test_id: &str) -> PanelResult<TestRun> {
        if self.yield_reads {
            tokio::task::yield_now().await;
        }
        self.inner.get_test_run(test_id).await
    }

    async fn set_test_status(&self, test_id: &str, update: StatusUpdate) -> PanelResult<()> {
        let what = format!("status:{}", update.status);
        let result = self.inner.set_test_status(test_id, update).await;
        self.record(result, what)
    }

    async fn insert_persona_responses(
        &self,
        test_id: &str,
        responses: &[PersonaResponse],
    ) -> PanelResult<()> {
        let result = self.inner.insert_persona_responses(test_id, responses).await;
        self.record(result, format!("responses:{}", responses.len()))
    }

    async fn insert_aggregated_result(
        &self,
        test_id: &str,
        result: &AggregatedResult,
    ) -> PanelResult<()> {
        let written = self.inner.insert_aggregated_result(test_id, result).await;
        self.record(written, "aggregate".to_string())
    }

    async fn create_test_run(&self, run: &TestRun) -> PanelResult<()> {
        let result = self.inner.create_test_run(run).await;
        self.record(result, "create".to_string())
    }

    async fn upsert_archetype(&self, archetype: &Archetype) -> PanelResult<()> {
        let result = self.inner.upsert_archetype(archetype).await;
        self.record(result, "archetype".to_string())
    }

    async fn list_persona_responses(&self, test_id: &str) -> PanelResult<Vec<PersonaResponse>> {
        self.inner.list_persona_responses(test_id).await
    }

    async fn get_aggregated_result(&self, test_id: &str) -> PanelResult<Option<AggregatedResult>> {
        self.inner.get_aggregated_result(test_id).await
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn archetype(id: &str, name: &str) -> Archetype {
    Archetype {
        id: id.to_string(),
        name: name.to_string(),
        demographics: [("age".to_string(), "40".to_string())].into_iter().collect(),
        psychographics: Psychographics {
            values: vec!["value for money".to_string()],
            motivations: vec!["saving time".to_string()],
            pain_points: vec!["hidden fees".to_string()],
        },
        baseline_skepticism: 5,
        persona_names: vec!["Sam".to_string(), "Alex".to_string()],
        memories: vec![ArchetypeMemory {
            text: "Once paid twice for a delivery".to_string(),
            trigger_words: vec!["delivery".to_string()],
        }],
    }
}

/// Seed archetypes `a1..=aN` and a draft test using them.
pub async fn seed_test(store: &SqliteStore, test_id: &str, stimulus: Stimulus, personas: usize) {
    let mut ids = Vec::new();
    for i in 1..=personas {
        let id = format!("a{}", i);
        store
            .upsert_archetype(&archetype(&id, &format!("Segment {}", i)))
            .await
            .unwrap();
        ids.push(id);
    }

    let run = TestRun::draft(
        test_id,
        TestConfig {
            stimulus,
            archetype_ids: ids,
            calibration: Calibration::Standard,
            category: "groceries".to_string(),
        },
    );
    store.create_test_run(&run).await.unwrap();
}

pub fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        rng_seed: Some(7),
        ..OrchestratorSettings::default()
    }
}

pub fn orchestrator(
    store: Arc<dyn Store>,
    provider: Arc<MockLlmProvider>,
    settings: OrchestratorSettings,
) -> TestOrchestrator {
    TestOrchestrator::new(
        store,
        Arc::new(LlmGenerationClient::new(provider)),
        RateLimiter::unthrottled(),
        settings,
    )
}

pub fn text_stimulus(content: &str, red_flags: &[&str]) -> Stimulus {
    Stimulus::Text {
        content: content.to_string(),
        brief: Some(focus_panel::models::Brief {
            product: Some("FreshBox".to_string()),
            red_flag_patterns: red_flags.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }),
    }
}

pub fn headline_stimulus(n: usize) -> Stimulus {
    Stimulus::Headlines {
        headlines: (1..=n).map(|i| format!("Headline {}", i)).collect(),
        brief: None,
    }
}

pub fn stimulus_answer(gut: &str, intent: u8, credibility: u8) -> String {
    json!({
        "gut_reaction": gut,
        "emotional_response": "curious",
        "purchase_intent": intent,
        "credibility_rating": credibility,
        "what_works": ["fresh ingredients"],
        "concerns": ["price"]
    })
    .to_string()
}

pub fn summary_answer() -> String {
    json!({
        "strengths": [{"point": "Fresh ingredients", "confidence": "high"}],
        "weaknesses": [{"point": "Price", "severity": "medium"}],
        "recommendations": [{"action": "Show the per-meal price", "priority": "high"}]
    })
    .to_string()
}

/// Headline answer rating headline `i + 1` with `scores[i]`. Top picks are the
/// three best-scored headlines, bottom picks the three worst.
pub fn headline_answer(scores: &[u8], winner: usize) -> String {
    let mut order: Vec<usize> = (1..=scores.len()).collect();
    order.sort_by(|a, b| scores[b - 1].cmp(&scores[a - 1]));
    let picks = scores.len().min(3);

    let top: Vec<_> = order
        .iter()
        .take(picks)
        .map(|i| json!({"headline_index": i, "why_it_works": format!("Headline {} is clear", i)}))
        .collect();
    let bottom: Vec<_> = order
        .iter()
        .rev()
        .take(picks)
        .map(|i| json!({"headline_index": i, "why_it_fails": format!("Headline {} is flat", i)}))
        .collect();
    let ratings: Vec<_> = scores
        .iter()
        .enumerate()
        .map(|(i, s)| json!({"headline_index": i + 1, "score": s}))
        .collect();

    json!({
        "top_3": top,
        "bottom_3": bottom,
        "all_ratings": ratings,
        "overall_winner": winner,
        "gut_reaction": format!("Headline {} says it best.", winner)
    })
    .to_string()
}

/// Parses as JSON but breaks the schema.
pub fn malformed_answer() -> String {
    json!({"gut_reaction": ""}).to_string()
}
