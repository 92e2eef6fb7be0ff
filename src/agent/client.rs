//! Provider registry and factory.
//!
//! Maps provider names to concrete [`LlmProvider`] implementations.

use async_openai::config::{AzureConfig, OpenAIConfig};

use crate::agent::config::AgentConfig;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenAiProvider;
use crate::error::AgentError;

/// Creates an [`LlmProvider`] based on the configured provider name.
///
/// # Supported Providers
///
/// - `"openai"` (default) — OpenAI-compatible APIs via `async-openai`
/// - `"azure"` — Azure `OpenAI` deployments (endpoint, deployment and API
///   version required)
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for unknown provider names and
/// [`AgentError::ConfigMissing`] when Azure settings are incomplete.
pub fn create_provider(config: &AgentConfig) -> Result<Box<dyn LlmProvider>, AgentError> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiProvider::<OpenAIConfig>::new(config))),
        "azure" => Ok(Box::new(OpenAiProvider::<AzureConfig>::azure(config)?)),
        other => Err(AgentError::UnsupportedProvider {
            name: other.to_string(),
        }),
    }
}
