//! Settings Models
//!
//! Engine configuration stored in config.json.

use std::time::Duration;

use focus_panel_llm::{ProviderConfig, ProviderType};
use serde::{Deserialize, Serialize};

/// Engine configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// LLM provider voicing the personas
    pub provider: ProviderType,
    /// Model name for the provider
    pub model: String,
    /// Optional endpoint override (compatible gateways)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Fixed spacing after each generation call, in milliseconds
    pub persona_delay_ms: u64,
    /// Rate limiter permits (1..=3)
    pub max_concurrent_calls: usize,
    /// Successful responses a run needs to complete
    pub min_successful_responses: usize,
    /// Memory snippets injected per persona
    pub memory_snippets: usize,
    /// Maximum verbatim highlights per headline tournament
    pub highlight_limit: usize,
    /// Optional wall-clock limit for a whole run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timeout_secs: Option<u64>,
    /// Seed for sampling; entropy when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::Anthropic,
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: None,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            request_timeout_secs: 120,
            persona_delay_ms: 1000,
            max_concurrent_calls: 1,
            min_successful_responses: 2,
            memory_snippets: 3,
            highlight_limit: 6,
            run_timeout_secs: None,
            rng_seed: None,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PanelConfigUpdate {
    pub provider: Option<ProviderType>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub persona_delay_ms: Option<u64>,
    pub max_concurrent_calls: Option<usize>,
    pub min_successful_responses: Option<usize>,
    pub memory_snippets: Option<usize>,
    pub highlight_limit: Option<usize>,
    pub run_timeout_secs: Option<u64>,
    pub rng_seed: Option<u64>,
}

impl PanelConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: PanelConfigUpdate) {
        if let Some(provider) = update.provider {
            self.provider = provider;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(base_url) = update.base_url {
            self.base_url = Some(base_url);
        }
        if let Some(env) = update.api_key_env {
            self.api_key_env = env;
        }
        if let Some(timeout) = update.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(delay) = update.persona_delay_ms {
            self.persona_delay_ms = delay;
        }
        if let Some(permits) = update.max_concurrent_calls {
            self.max_concurrent_calls = permits;
        }
        if let Some(min) = update.min_successful_responses {
            self.min_successful_responses = min;
        }
        if let Some(snippets) = update.memory_snippets {
            self.memory_snippets = snippets;
        }
        if let Some(limit) = update.highlight_limit {
            self.highlight_limit = limit;
        }
        if let Some(secs) = update.run_timeout_secs {
            self.run_timeout_secs = Some(secs);
        }
        if let Some(seed) = update.rng_seed {
            self.rng_seed = Some(seed);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }

        if self.api_key_env.trim().is_empty() {
            return Err("api_key_env must name an environment variable".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be at least 1".to_string());
        }

        if !(1..=3).contains(&self.max_concurrent_calls) {
            return Err(format!(
                "max_concurrent_calls must be between 1 and 3, got {}",
                self.max_concurrent_calls
            ));
        }

        if self.min_successful_responses < 2 {
            return Err("min_successful_responses cannot be lower than 2".to_string());
        }

        if self.highlight_limit == 0 {
            return Err("highlight_limit must be at least 1".to_string());
        }

        if self.run_timeout_secs == Some(0) {
            return Err("run_timeout_secs must be at least 1 when set".to_string());
        }

        Ok(())
    }

    /// Provider configuration with the API key read from the environment.
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider,
            api_key: std::env::var(&self.api_key_env).ok(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            request_timeout_secs: self.request_timeout_secs,
            ..ProviderConfig::default()
        }
    }

    pub fn persona_delay(&self) -> Duration {
        Duration::from_millis(self.persona_delay_ms)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}
