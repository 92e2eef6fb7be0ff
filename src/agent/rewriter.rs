//! Query rewriting.
//!
//! Automatic mode asks the model for an improved question; human mode
//! normalises a replacement question supplied from outside the run. The
//! mode is fixed per deployment by [`RewriteMode`](super::config::RewriteMode).

use async_trait::async_trait;

use super::config::AgentConfig;
use super::prompt::build_rewrite_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::error::AgentError;

/// Agent that reformulates a question.
pub struct RewriteAgent {
    model: String,
    max_tokens: u32,
    template: String,
}

impl RewriteAgent {
    /// Creates a rewrite agent with the given prompt template.
    #[must_use]
    pub fn new(config: &AgentConfig, template: String) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            template,
        }
    }

    /// Asks the model for an improved version of `question`.
    ///
    /// The reply is returned verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on provider failures.
    pub async fn rewrite(
        &self,
        provider: &dyn LlmProvider,
        question: &str,
    ) -> Result<String, AgentError> {
        let prompt = build_rewrite_prompt(&self.template, question);
        let response = self.execute(provider, &prompt).await?;
        Ok(response.content)
    }
}

#[async_trait]
impl Agent for RewriteAgent {
    fn name(&self) -> &'static str {
        "rewriter"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Normalises a human-supplied replacement question.
///
/// Strips a leading `Human rewrite:` marker (any case) and surrounding
/// whitespace.
#[must_use]
pub fn apply_human_rewrite(input: &str) -> String {
    strip_human_marker(input).unwrap_or(input).trim().to_string()
}

/// Returns the text after a leading `human rewrite:` marker, if present.
///
/// The two words may be separated by any whitespace, and the colon may be
/// preceded by whitespace.
fn strip_human_marker(input: &str) -> Option<&str> {
    let rest = strip_prefix_ignore_case(input.trim_start(), "human")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = strip_prefix_ignore_case(rest.trim_start(), "rewrite")?;
    rest.trim_start().strip_prefix(':')
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}
