//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Default model for every agent in the graph.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default max tokens for decision and rewrite calls.
const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Default max tokens for the answer call. Answers are capped at three
/// sentences by the prompt, so this only guards against runaway output.
const DEFAULT_ANSWER_MAX_TOKENS: u32 = 512;
/// Default rewrite ceiling per run.
const DEFAULT_MAX_REWRITES: usize = 3;
/// Default number of passages the retrieval tool returns.
const DEFAULT_TOP_K: usize = 4;
/// Default retrieval tool name.
pub const DEFAULT_TOOL_NAME: &str = "retrieve_blog_posts";
/// Default retrieval tool description.
pub const DEFAULT_TOOL_DESCRIPTION: &str = "Search and return information about Lilian Weng's \
    blog posts on AI topics like reward hacking, hallucination, and diffusion models.";

/// How the rewrite node obtains a new question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewriteMode {
    /// The model reformulates the original question.
    #[default]
    Auto,
    /// The run suspends and a human supplies the replacement question.
    Human,
}

impl RewriteMode {
    /// Parses a mode name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "human" => Some(Self::Human),
            _ => None,
        }
    }
}

/// What happens when the grader asks for a rewrite past `max_rewrites`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteLimitPolicy {
    /// Surface [`AgentError::UnboundedRewriteLoop`] to the caller.
    #[default]
    Fail,
    /// Answer from the latest retrieved context anyway.
    AnswerAnyway,
}

impl RewriteLimitPolicy {
    /// Parses a policy name (case-insensitive, `-` or `_` separated).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fail" => Some(Self::Fail),
            "answer_anyway" | "answer" => Some(Self::AnswerAnyway),
            _ => None,
        }
    }
}

/// Which relevance grader the deployment uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraderKind {
    /// Term-overlap heuristic (no model call).
    #[default]
    TermOverlap,
    /// Binary relevance judgement from the model.
    Model,
}

impl GraderKind {
    /// Parses a grader name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "overlap" | "term_overlap" => Some(Self::TermOverlap),
            "model" | "llm" => Some(Self::Model),
            _ => None,
        }
    }
}

/// Configuration for the agent system.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (`"openai"` or `"azure"`).
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Base URL override; the resource endpoint for Azure.
    pub base_url: Option<String>,
    /// Azure deployment name.
    pub deployment: Option<String>,
    /// Azure API version.
    pub api_version: Option<String>,
    /// Model used by every agent.
    pub model: String,
    /// Maximum tokens for decision, rewrite, and grading responses.
    pub max_tokens: u32,
    /// Maximum tokens for the final answer.
    pub answer_max_tokens: u32,
    /// Rewrite ceiling per run.
    pub max_rewrites: usize,
    /// How rewrites are produced.
    pub rewrite_mode: RewriteMode,
    /// What to do when the rewrite ceiling is reached.
    pub rewrite_limit_policy: RewriteLimitPolicy,
    /// Which relevance grader to use.
    pub grader: GraderKind,
    /// Passages returned per retrieval.
    pub top_k: usize,
    /// Name the retrieval tool is exposed under.
    pub tool_name: String,
    /// Description the model sees for the retrieval tool.
    pub tool_description: String,
    /// Directory containing prompt template files.
    ///
    /// When set, prompts are loaded from markdown files in this directory,
    /// falling back to compiled-in defaults for any missing files.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    deployment: Option<String>,
    api_version: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    answer_max_tokens: Option<u32>,
    max_rewrites: Option<usize>,
    rewrite_mode: Option<RewriteMode>,
    rewrite_limit_policy: Option<RewriteLimitPolicy>,
    grader: Option<GraderKind>,
    top_k: Option<usize>,
    tool_name: Option<String>,
    tool_description: Option<String>,
    prompt_dir: Option<PathBuf>,
}

fn env_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok())
        .filter(|v| !v.trim().is_empty())
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = env_var(&["RAG_PROVIDER"]);
        }
        if self.api_key.is_none() {
            self.api_key = env_var(&["OPENAI_API_KEY", "AZURE_OPENAI_API_KEY", "RAG_API_KEY"]);
        }
        if self.base_url.is_none() {
            self.base_url = env_var(&["OPENAI_BASE_URL", "AZURE_OPENAI_ENDPOINT", "RAG_BASE_URL"]);
        }
        if self.deployment.is_none() {
            self.deployment = env_var(&["AZURE_OPENAI_DEPLOYMENT_NAME"]);
        }
        if self.api_version.is_none() {
            self.api_version = env_var(&["AZURE_OPENAI_API_VERSION"]);
        }
        if self.model.is_none() {
            self.model = env_var(&["RAG_MODEL"]);
        }
        if self.max_rewrites.is_none() {
            self.max_rewrites = env_var(&["RAG_MAX_REWRITES"]).and_then(|v| v.parse().ok());
        }
        if self.rewrite_mode.is_none() {
            self.rewrite_mode = env_var(&["RAG_REWRITE_MODE"]).and_then(|v| RewriteMode::parse(&v));
        }
        if self.grader.is_none() {
            self.grader = env_var(&["RAG_GRADER"]).and_then(|v| GraderKind::parse(&v));
        }
        if self.top_k.is_none() {
            self.top_k = env_var(&["RAG_TOP_K"]).and_then(|v| v.parse().ok());
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = env_var(&["RAG_PROMPT_DIR"]).map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override (Azure endpoint for `azure`).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the Azure deployment name.
    #[must_use]
    pub fn deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = Some(deployment.into());
        self
    }

    /// Sets the Azure API version.
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the max tokens for decision, rewrite and grading calls.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the max tokens for the answer call.
    #[must_use]
    pub const fn answer_max_tokens(mut self, n: u32) -> Self {
        self.answer_max_tokens = Some(n);
        self
    }

    /// Sets the rewrite ceiling.
    #[must_use]
    pub const fn max_rewrites(mut self, n: usize) -> Self {
        self.max_rewrites = Some(n);
        self
    }

    /// Sets the rewrite mode.
    #[must_use]
    pub const fn rewrite_mode(mut self, mode: RewriteMode) -> Self {
        self.rewrite_mode = Some(mode);
        self
    }

    /// Sets the rewrite-limit policy.
    #[must_use]
    pub const fn rewrite_limit_policy(mut self, policy: RewriteLimitPolicy) -> Self {
        self.rewrite_limit_policy = Some(policy);
        self
    }

    /// Sets the grader.
    #[must_use]
    pub const fn grader(mut self, grader: GraderKind) -> Self {
        self.grader = Some(grader);
        self
    }

    /// Sets the number of passages per retrieval.
    #[must_use]
    pub const fn top_k(mut self, n: usize) -> Self {
        self.top_k = Some(n);
        self
    }

    /// Sets the retrieval tool name.
    #[must_use]
    pub fn tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = Some(name.into());
        self
    }

    /// Sets the retrieval tool description.
    #[must_use]
    pub fn tool_description(mut self, description: impl Into<String>) -> Self {
        self.tool_description = Some(description.into());
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self.api_key.ok_or(AgentError::ApiKeyMissing)?;

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            deployment: self.deployment,
            api_version: self.api_version,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            answer_max_tokens: self.answer_max_tokens.unwrap_or(DEFAULT_ANSWER_MAX_TOKENS),
            max_rewrites: self.max_rewrites.unwrap_or(DEFAULT_MAX_REWRITES),
            rewrite_mode: self.rewrite_mode.unwrap_or_default(),
            rewrite_limit_policy: self.rewrite_limit_policy.unwrap_or_default(),
            grader: self.grader.unwrap_or_default(),
            top_k: self.top_k.unwrap_or(DEFAULT_TOP_K).max(1),
            tool_name: self
                .tool_name
                .unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string()),
            tool_description: self
                .tool_description
                .unwrap_or_else(|| DEFAULT_TOOL_DESCRIPTION.to_string()),
            prompt_dir: self.prompt_dir,
        })
    }
}
