//! Test Orchestrator
//!
//! Drives a test run through `draft -> running -> {completed, failed}`.
//!
//! Personas are evaluated sequentially in configured order, each call going
//! through the shared [`RateLimiter`]. A persona whose output still fails
//! after its single retry is recorded as a local failure and the run carries
//! on. Once every persona has been tried the run either completes (enough
//! successes, aggregate and responses persisted) or fails (nothing but the
//! status is persisted).

pub mod rate_limiter;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use focus_panel_core::TestStatus;
use focus_panel_llm::{create_provider, UsageStats};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    AggregatedResult, Archetype, EvaluationPayload, PanelConfig, PersonaContext, PersonaFailure,
    PersonaOutcome, PersonaResponse, RunHeadline, RunSummary, StatusUpdate, Stimulus, TestRun,
};
use crate::services::aggregation::{aggregate_headlines, summarize_stimulus};
use crate::services::generation::{
    generate_validated, validate_headline_evaluation, validate_stimulus_evaluation,
    GenerationClient, GenerationFailed, LlmGenerationClient, TaskKind, Validated,
};
use crate::services::moderator::detect_intervention;
use crate::services::persona::{build_context, resolve_archetype, ContextRequest};
use crate::services::prompts::{build_headline_prompt, build_stimulus_prompt};
use crate::storage::Store;
use crate::utils::error::{PanelError, PanelResult};

pub use rate_limiter::RateLimiter;

/// Message persisted on a run that was cancelled or timed out.
pub const CANCELLED_MESSAGE: &str = "cancelled";

/// Run-level knobs taken from [`PanelConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub min_successful_responses: usize,
    pub memory_snippets: usize,
    pub highlight_limit: usize,
    pub run_timeout: Option<Duration>,
    pub rng_seed: Option<u64>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&PanelConfig::default())
    }
}

impl From<&PanelConfig> for OrchestratorSettings {
    fn from(config: &PanelConfig) -> Self {
        Self {
            min_successful_responses: config.min_successful_responses,
            memory_snippets: config.memory_snippets,
            highlight_limit: config.highlight_limit,
            run_timeout: config.run_timeout(),
            rng_seed: config.rng_seed,
        }
    }
}

/// Successful panel collected by the persona loop.
struct PanelRound {
    responses: Vec<PersonaResponse>,
    failures: Vec<PersonaFailure>,
    usage: UsageStats,
}

pub struct TestOrchestrator {
    store: Arc<dyn Store>,
    client: Arc<dyn GenerationClient>,
    limiter: RateLimiter,
    settings: OrchestratorSettings,
}

impl TestOrchestrator {
    pub fn new(
        store: Arc<dyn Store>,
        client: Arc<dyn GenerationClient>,
        limiter: RateLimiter,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            client,
            limiter,
            settings,
        }
    }

    /// Wire an orchestrator from config: provider, client and rate limiter.
    pub fn from_config(config: &PanelConfig, store: Arc<dyn Store>) -> PanelResult<Self> {
        config.validate().map_err(PanelError::config)?;
        let provider = create_provider(config.provider_config())?;
        let client: Arc<dyn GenerationClient> = Arc::new(LlmGenerationClient::new(provider));
        let limiter = RateLimiter::from_config(config)?;
        Ok(Self::new(store, client, limiter, OrchestratorSettings::from(config)))
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Run a test to completion, applying the configured run timeout.
    pub async fn run_test(&self, test_id: &str) -> PanelResult<RunSummary> {
        let token = CancellationToken::new();

        let Some(limit) = self.settings.run_timeout else {
            return self.run_test_with_cancellation(test_id, token).await;
        };

        let timed_out = Arc::new(AtomicBool::new(false));
        let timer = {
            let token = token.clone();
            let timed_out = timed_out.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                timed_out.store(true, Ordering::SeqCst);
                token.cancel();
            })
        };

        let result = self.run_test_with_cancellation(test_id, token).await;
        timer.abort();

        match result {
            Err(err)
                if timed_out.load(Ordering::SeqCst)
                    && matches!(err.root_cause(), PanelError::Cancelled(_)) =>
            {
                let timeout = PanelError::Cancelled(format!("run timed out after {:?}", limit));
                Err(if err.is_pre_start() {
                    PanelError::not_started(timeout)
                } else {
                    timeout
                })
            }
            other => other,
        }
    }

    /// Run a test to completion, stopping early when `token` is cancelled.
    ///
    /// Errors raised before the run is marked `running` come back wrapped in
    /// [`PanelError::NotStarted`] and leave the test untouched. Every other
    /// failure leaves the run `failed`.
    pub async fn run_test_with_cancellation(
        &self,
        test_id: &str,
        token: CancellationToken,
    ) -> PanelResult<RunSummary> {
        let started = Instant::now();

        let (run, archetypes) = self
            .start(test_id, &token)
            .await
            .map_err(PanelError::not_started)?;
        info!(
            test_id,
            personas = archetypes.len(),
            kind = ?run.config.stimulus.kind(),
            "test run started"
        );

        match self.execute(&run, &archetypes, &token, started).await {
            Ok(summary) => Ok(summary),
            Err(err) => {
                let message = match &err {
                    PanelError::Cancelled(_) => CANCELLED_MESSAGE.to_string(),
                    other => other.to_string(),
                };
                warn!(test_id, error = %err, "test run failed");
                if let Err(write_err) = self
                    .store
                    .set_test_status(test_id, StatusUpdate::failed(Utc::now(), message))
                    .await
                {
                    warn!(test_id, error = %write_err, "could not record failed status");
                }
                Err(err)
            }
        }
    }

    /// Check the run can start, resolve its archetypes and claim it.
    ///
    /// The `running` write is the claim: the store only accepts it from
    /// `draft`, so a concurrent start of the same test fails here.
    async fn start(
        &self,
        test_id: &str,
        token: &CancellationToken,
    ) -> PanelResult<(TestRun, Vec<Archetype>)> {
        let run = self.store.get_test_run(test_id).await?;
        run.status.transition(TestStatus::Running)?;

        if run.config.archetype_ids.is_empty() {
            return Err(PanelError::config(format!(
                "test '{}' has no archetypes configured",
                test_id
            )));
        }
        run.config
            .stimulus
            .validate()
            .map_err(|e| PanelError::config(format!("test '{}': {}", test_id, e)))?;

        let mut archetypes = Vec::with_capacity(run.config.archetype_ids.len());
        for archetype_id in &run.config.archetype_ids {
            archetypes.push(resolve_archetype(self.store.as_ref(), archetype_id).await?);
        }

        if token.is_cancelled() {
            return Err(PanelError::Cancelled(CANCELLED_MESSAGE.to_string()));
        }

        self.store
            .set_test_status(test_id, StatusUpdate::running(Utc::now()))
            .await?;
        Ok((run, archetypes))
    }

    async fn execute(
        &self,
        run: &TestRun,
        archetypes: &[Archetype],
        token: &CancellationToken,
        started: Instant,
    ) -> PanelResult<RunSummary> {
        let mut rng = match self.settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let round = self.evaluate_panel(run, archetypes, token, &mut rng).await?;
        let mut usage = round.usage;

        let succeeded = round.responses.len();
        let required = self.settings.min_successful_responses;
        if succeeded < required {
            return Err(PanelError::InsufficientResponses {
                succeeded,
                required,
            });
        }

        let aggregate = match &run.config.stimulus {
            Stimulus::Text { content, brief } => {
                let summary = summarize_stimulus(
                    self.client.as_ref(),
                    content,
                    brief.as_ref(),
                    &round.responses,
                );
                let (aggregate, summary_usage) = tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        return Err(PanelError::Cancelled(CANCELLED_MESSAGE.to_string()));
                    }
                    result = self.limiter.run(summary) => result??,
                };
                usage.accumulate(&summary_usage);
                AggregatedResult::Stimulus(aggregate)
            }
            Stimulus::Headlines { headlines, .. } => AggregatedResult::Headline(aggregate_headlines(
                headlines,
                &round.responses,
                self.settings.highlight_limit,
                &mut rng,
            )?),
        };

        self.store
            .insert_aggregated_result(&run.id, &aggregate)
            .await?;
        self.store
            .insert_persona_responses(&run.id, &round.responses)
            .await?;
        self.store
            .set_test_status(&run.id, StatusUpdate::completed(Utc::now()))
            .await?;

        let summary = RunSummary {
            test_id: run.id.clone(),
            status: TestStatus::Completed,
            response_count: succeeded,
            failed_count: round.failures.len(),
            execution_time_ms: started.elapsed().as_millis() as u64,
            summary: RunHeadline::from(&aggregate),
            usage,
        };

        info!(
            test_id = %run.id,
            responses = summary.response_count,
            failed = summary.failed_count,
            elapsed_ms = summary.execution_time_ms,
            total_tokens = usage.total_tokens(),
            "test run completed"
        );

        Ok(summary)
    }

    /// Evaluate every persona in configured order.
    async fn evaluate_panel(
        &self,
        run: &TestRun,
        archetypes: &[Archetype],
        token: &CancellationToken,
        rng: &mut StdRng,
    ) -> PanelResult<PanelRound> {
        let stimulus = &run.config.stimulus;
        let request = ContextRequest {
            stimulus,
            category: &run.config.category,
            calibration: run.config.calibration,
            memory_limit: self.settings.memory_snippets,
        };

        let mut round = PanelRound {
            responses: Vec::with_capacity(archetypes.len()),
            failures: Vec::new(),
            usage: UsageStats::default(),
        };

        for archetype in archetypes {
            if token.is_cancelled() {
                return Err(PanelError::Cancelled(CANCELLED_MESSAGE.to_string()));
            }

            let context = build_context(archetype, &request, rng);
            debug!(
                test_id = %run.id,
                archetype = %archetype.id,
                persona = %context.persona_name,
                skepticism = context.skepticism,
                "evaluating persona"
            );

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    return Err(PanelError::Cancelled(CANCELLED_MESSAGE.to_string()));
                }
                result = self.limiter.run(self.evaluate_persona(&context, stimulus)) => result?,
            };

            let outcome = match result {
                Ok(validated) => {
                    PersonaOutcome::Succeeded(self.to_response(&run.id, context, stimulus, validated))
                }
                Err(failed) => PersonaOutcome::Failed(Self::to_failure(&run.id, context, failed)),
            };

            round.usage.accumulate(outcome.usage());
            match outcome {
                PersonaOutcome::Succeeded(response) => round.responses.push(response),
                PersonaOutcome::Failed(failure) => round.failures.push(failure),
            }
        }

        Ok(round)
    }

    async fn evaluate_persona(
        &self,
        context: &PersonaContext,
        stimulus: &Stimulus,
    ) -> Result<Validated<EvaluationPayload>, GenerationFailed> {
        let client = self.client.as_ref();
        match stimulus {
            Stimulus::Text { content, brief } => {
                let prompt = build_stimulus_prompt(context, content, brief.as_ref());
                generate_validated(
                    client,
                    TaskKind::StimulusEvaluation,
                    &prompt.system,
                    &prompt.user,
                    |value| validate_stimulus_evaluation(value).map(EvaluationPayload::Stimulus),
                )
                .await
            }
            Stimulus::Headlines { headlines, brief } => {
                let count = headlines.len();
                let prompt = build_headline_prompt(context, headlines, brief.as_ref());
                generate_validated(
                    client,
                    TaskKind::HeadlineEvaluation,
                    &prompt.system,
                    &prompt.user,
                    |value| {
                        validate_headline_evaluation(value, count).map(EvaluationPayload::Headline)
                    },
                )
                .await
            }
        }
    }

    fn to_response(
        &self,
        test_id: &str,
        context: PersonaContext,
        stimulus: &Stimulus,
        validated: Validated<EvaluationPayload>,
    ) -> PersonaResponse {
        let moderator_flag =
            detect_intervention(validated.value.narrative(), stimulus.red_flag_patterns());

        info!(
            test_id,
            persona = %context.persona_name,
            attempts = validated.attempts,
            flag = moderator_flag.map(|f| f.as_str()),
            "persona responded"
        );

        PersonaResponse {
            id: Uuid::new_v4().to_string(),
            test_id: test_id.to_string(),
            archetype_id: context.archetype_id,
            archetype_name: context.archetype_name,
            persona_name: context.persona_name,
            evaluation: validated.value,
            moderator_flag,
            attempts: validated.attempts,
            usage: validated.usage,
            created_at: Utc::now(),
        }
    }

    fn to_failure(test_id: &str, context: PersonaContext, failed: GenerationFailed) -> PersonaFailure {
        warn!(
            test_id,
            persona = %context.persona_name,
            attempts = failed.attempts,
            error = %failed.error,
            "persona gave no usable response"
        );

        PersonaFailure {
            archetype_id: context.archetype_id,
            persona_name: context.persona_name,
            reason: failed.error.to_string(),
            attempts: failed.attempts,
            usage: failed.usage,
        }
    }
}
