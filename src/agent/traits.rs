//! Agent trait definition.
//!
//! The decision, rewrite, grading and answer agents all implement this
//! trait, which gives the orchestrator a uniform way to build requests and
//! call the provider.

use async_trait::async_trait;

use super::message::{ChatMessage, ChatRequest, ChatResponse, TokenUsage, system_message, user_message};
use super::provider::LlmProvider;
use super::tool::ToolDefinition;
use crate::error::AgentError;

/// Response from a single-prompt agent execution.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The agent's text output.
    pub content: String,
    /// Token usage for this call.
    pub usage: TokenUsage,
    /// Why the model stopped generating (e.g. `"stop"`, `"length"`).
    pub finish_reason: Option<String>,
}

/// Trait implemented by all agents in the graph.
///
/// Agents encapsulate one role with a fixed model configuration. Agents that
/// may invoke tools override [`Agent::tools`]; the provider then runs a
/// tool-augmented completion instead of a plain one.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for logging and identification.
    fn name(&self) -> &'static str;

    /// Model identifier to use for this agent.
    fn model(&self) -> &str;

    /// Optional system prompt prepended to every request.
    fn system_prompt(&self) -> Option<&str> {
        None
    }

    /// Sampling temperature (0.0 = deterministic, higher = more creative).
    fn temperature(&self) -> f32 {
        0.0
    }

    /// Maximum tokens for the response.
    fn max_tokens(&self) -> u32 {
        1024
    }

    /// Tool definitions available to this agent. Empty by default.
    fn tools(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    /// Builds a request over the given history.
    fn build_request(&self, history: &[ChatMessage]) -> ChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(system) = self.system_prompt() {
            messages.push(system_message(system));
        }
        messages.extend_from_slice(history);

        ChatRequest {
            model: self.model().to_string(),
            messages,
            temperature: Some(self.temperature()),
            max_tokens: Some(self.max_tokens()),
            tools: self.tools(),
        }
    }

    /// Sends the full history to the provider and returns the raw response,
    /// which may contain tool calls when [`Agent::tools`] is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on provider failures.
    async fn converse(
        &self,
        provider: &dyn LlmProvider,
        history: &[ChatMessage],
    ) -> Result<ChatResponse, AgentError> {
        let request = self.build_request(history);
        provider.chat(&request).await
    }

    /// Executes the agent with a single user message.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on provider failures.
    async fn execute(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<AgentResponse, AgentError> {
        let response = self.converse(provider, &[user_message(user_msg)]).await?;

        Ok(AgentResponse {
            content: response.content,
            usage: response.usage,
            finish_reason: response.finish_reason,
        })
    }
}
