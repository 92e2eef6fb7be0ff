//! Decision-step agent.
//!
//! Sends the whole conversation to the model with the retrieval tool bound.
//! The model either answers directly or asks for a retrieval; the
//! orchestrator turns that into a route.

use async_trait::async_trait;

use super::config::AgentConfig;
use super::message::{ChatMessage, ChatResponse};
use super::provider::LlmProvider;
use super::tool::ToolDefinition;
use super::traits::Agent;
use crate::error::AgentError;

/// Agent that generates a retrieval query or responds to the user.
pub struct RouterAgent {
    model: String,
    max_tokens: u32,
    system_prompt: Option<String>,
    tool: ToolDefinition,
}

impl RouterAgent {
    /// Creates a router bound to the given tool definition.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: Option<String>, tool: ToolDefinition) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            system_prompt,
            tool,
        }
    }

    /// Runs the tool-augmented completion over the conversation.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on provider failures.
    pub async fn decide(
        &self,
        provider: &dyn LlmProvider,
        conversation: &[ChatMessage],
    ) -> Result<ChatResponse, AgentError> {
        self.converse(provider, conversation).await
    }
}

#[async_trait]
impl Agent for RouterAgent {
    fn name(&self) -> &'static str {
        "router"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![self.tool.clone()]
    }
}
