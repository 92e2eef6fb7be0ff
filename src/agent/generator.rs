//! Answer generation from retrieved context.

use async_trait::async_trait;

use super::config::AgentConfig;
use super::prompt::build_answer_prompt;
use super::provider::LlmProvider;
use super::traits::{Agent, AgentResponse};
use crate::error::AgentError;

/// Agent that answers the original question from retrieved context only.
///
/// Sends a single user prompt (no history, no tools) and returns the reply
/// as the final answer.
pub struct AnswerAgent {
    model: String,
    max_tokens: u32,
    template: String,
}

impl AnswerAgent {
    /// Creates an answer agent with the given prompt template.
    #[must_use]
    pub fn new(config: &AgentConfig, template: String) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.answer_max_tokens,
            template,
        }
    }

    /// Answers `question` from `context`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on provider failures.
    pub async fn answer(
        &self,
        provider: &dyn LlmProvider,
        question: &str,
        context: &str,
    ) -> Result<AgentResponse, AgentError> {
        let prompt = build_answer_prompt(&self.template, question, context);
        self.execute(provider, &prompt).await
    }
}

#[async_trait]
impl Agent for AnswerAgent {
    fn name(&self) -> &'static str {
        "generator"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}
