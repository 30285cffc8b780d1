//! Generation Client
//!
//! Sends one prompt to the model and returns its output parsed as JSON along
//! with token usage. Per-call timeouts are owned by the provider's HTTP client.

use std::sync::Arc;

use async_trait::async_trait;
use focus_panel_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResult, Message, UsageStats,
};
use serde_json::Value;
use tracing::debug;

/// Sampling parameters for one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub system: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Parsed model output.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutput {
    pub parsed: Value,
    pub raw_text: String,
    pub usage: UsageStats,
}

/// Completion interface the orchestrator depends on.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Complete `prompt`, failing with `ParseError` when no JSON can be read
    /// from the response.
    async fn complete(&self, prompt: &str, options: &CompletionOptions)
        -> LlmResult<GenerationOutput>;
}

/// [`GenerationClient`] backed by an [`LlmProvider`].
pub struct LlmGenerationClient {
    provider: Arc<dyn LlmProvider>,
}

impl LlmGenerationClient {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl GenerationClient for LlmGenerationClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> LlmResult<GenerationOutput> {
        let request_options = LlmRequestOptions {
            temperature_override: Some(options.temperature),
            max_tokens_override: Some(options.max_tokens),
        };

        let response = self
            .provider
            .send_message(
                vec![Message::user(prompt)],
                options.system.clone(),
                request_options,
            )
            .await?;

        let text = response.text().ok_or_else(|| LlmError::ParseError {
            message: format!(
                "model returned no text (model: {}, stop_reason: {:?})",
                response.model, response.stop_reason
            ),
        })?;

        let parsed = parse_json_payload(text)?;

        debug!(
            provider = self.provider.name(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "generation complete"
        );

        Ok(GenerationOutput {
            parsed,
            raw_text: text.to_string(),
            usage: response.usage,
        })
    }
}

/// Pull the JSON payload out of a model response.
///
/// Handles markdown code fences and prose around a JSON object or array.
pub fn extract_json(response_text: &str) -> &str {
    let trimmed = response_text.trim();

    // ```json ... ``` or ``` ... ```
    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let content_start = after_fence.find('\n').map(|nl| nl + 1).unwrap_or(0);
        let content = &after_fence[content_start..];
        if let Some(end) = content.find("```") {
            return content[..end].trim();
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

/// Extract and parse the JSON payload of a response.
pub fn parse_json_payload(response_text: &str) -> LlmResult<Value> {
    let json_str = extract_json(response_text);
    serde_json::from_str(json_str).map_err(|e| LlmError::ParseError {
        message: format!("response is not valid JSON: {}", e),
    })
}
