//! HTTP Client Factory
//!
//! Provides a factory function for building reqwest clients with a per-request timeout.

use std::time::Duration;

use crate::types::{LlmError, LlmResult};

/// Build a `reqwest::Client` whose requests time out after `timeout_secs`.
///
/// The timeout is the only per-call deadline in the generation path; callers
/// above the provider do not impose their own.
pub fn build_http_client(timeout_secs: u64) -> LlmResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| LlmError::Other {
            message: format!("failed to build HTTP client: {}", e),
        })
}
