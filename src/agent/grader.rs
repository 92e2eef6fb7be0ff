//! Relevance grading of retrieved content.
//!
//! A grader takes the original question and the latest retrieved text and
//! returns one of two labels. The orchestrator only sees the
//! [`RelevanceGrader`] trait, so the term-overlap heuristic and the
//! model-backed grader are interchangeable per deployment.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{AgentConfig, GraderKind};
use super::prompt::build_grade_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::error::AgentError;

/// Minimum shared terms for the heuristic to accept content.
pub const DEFAULT_MIN_OVERLAP: usize = 2;
/// Content longer than this many characters is accepted regardless of overlap.
pub const DEFAULT_LENGTH_OVERRIDE: usize = 100;

/// Grading verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    /// Content is relevant; answer from it.
    Answer,
    /// Content is not relevant; rewrite the question and retry.
    Rewrite,
}

impl Grade {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Answer => "answer",
            Self::Rewrite => "rewrite",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores retrieved content against the question it was retrieved for.
#[async_trait]
pub trait RelevanceGrader: Send + Sync {
    /// Grader name for logging.
    fn name(&self) -> &'static str;

    /// Grades `content` against `question`.
    ///
    /// Empty or whitespace-only content must always grade as
    /// [`Grade::Rewrite`].
    ///
    /// # Errors
    ///
    /// Model-backed graders propagate provider failures.
    async fn grade(&self, question: &str, content: &str) -> Result<Grade, AgentError>;
}

/// Term-overlap heuristic.
///
/// Both strings are lowercased and split on whitespace into term sets.
/// Content is accepted when the sets share at least `min_overlap` terms, or
/// when the content is longer than `length_override` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermOverlapGrader {
    min_overlap: usize,
    length_override: usize,
}

impl Default for TermOverlapGrader {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_OVERLAP, DEFAULT_LENGTH_OVERRIDE)
    }
}

impl TermOverlapGrader {
    /// Creates a grader with custom thresholds.
    #[must_use]
    pub const fn new(min_overlap: usize, length_override: usize) -> Self {
        Self {
            min_overlap,
            length_override,
        }
    }

    /// Number of distinct lowercase whitespace-separated terms shared by both strings.
    #[must_use]
    pub fn overlap(question: &str, content: &str) -> usize {
        let question = question.to_lowercase();
        let content = content.to_lowercase();
        let question_terms: HashSet<&str> = question.split_whitespace().collect();
        let content_terms: HashSet<&str> = content.split_whitespace().collect();
        question_terms.intersection(&content_terms).count()
    }

    /// Synchronous grading used by the async trait method.
    #[must_use]
    pub fn evaluate(&self, question: &str, content: &str) -> Grade {
        if content.trim().is_empty() {
            return Grade::Rewrite;
        }

        let overlap = Self::overlap(question, content);
        let length = content.chars().count();
        let grade = if overlap >= self.min_overlap || length > self.length_override {
            Grade::Answer
        } else {
            Grade::Rewrite
        };

        debug!(overlap, length, %grade, "term overlap grade");
        grade
    }
}

#[async_trait]
impl RelevanceGrader for TermOverlapGrader {
    fn name(&self) -> &'static str {
        "term_overlap"
    }

    async fn grade(&self, question: &str, content: &str) -> Result<Grade, AgentError> {
        Ok(self.evaluate(question, content))
    }
}

/// Agent that returns a binary `yes`/`no` relevance judgement.
pub struct GraderAgent {
    model: String,
    max_tokens: u32,
}

impl GraderAgent {
    /// Creates a new grader agent.
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl Agent for GraderAgent {
    fn name(&self) -> &'static str {
        "grader"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Model-backed grader.
///
/// Asks the model whether the retrieved document is relevant and maps a
/// `yes` verdict to [`Grade::Answer`]; any other reply grades as
/// [`Grade::Rewrite`].
pub struct ModelGrader {
    provider: Arc<dyn LlmProvider>,
    agent: GraderAgent,
    template: String,
}

impl ModelGrader {
    /// Creates a model grader over the given provider and prompt template.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: &AgentConfig, template: String) -> Self {
        Self {
            provider,
            agent: GraderAgent::new(config),
            template,
        }
    }

    /// Interprets the model's reply.
    fn parse_verdict(reply: &str) -> Grade {
        let verdict = reply
            .trim()
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if verdict.starts_with("yes") {
            Grade::Answer
        } else {
            Grade::Rewrite
        }
    }
}

#[async_trait]
impl RelevanceGrader for ModelGrader {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn grade(&self, question: &str, content: &str) -> Result<Grade, AgentError> {
        if content.trim().is_empty() {
            return Ok(Grade::Rewrite);
        }

        let prompt = build_grade_prompt(&self.template, question, content);
        let response = self.agent.execute(self.provider.as_ref(), &prompt).await?;
        let grade = Self::parse_verdict(&response.content);
        debug!(reply = %response.content.trim(), %grade, "model grade");
        Ok(grade)
    }
}

/// Creates the grader selected by [`AgentConfig::grader`].
#[must_use]
pub fn create_grader(
    config: &AgentConfig,
    provider: Arc<dyn LlmProvider>,
    template: &str,
) -> Arc<dyn RelevanceGrader> {
    match config.grader {
        GraderKind::TermOverlap => Arc::new(TermOverlapGrader::default()),
        GraderKind::Model => Arc::new(ModelGrader::new(provider, config, template.to_string())),
    }
}
