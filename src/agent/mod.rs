//! Model-facing agents for the conversation graph.
//!
//! Each graph step that talks to the language model is an [`Agent`] with a
//! fixed model configuration. Agents are stateless; the orchestrator passes
//! them the conversation (or the pieces of it they need) on every call.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//!   ├── RouterAgent     (decide: answer directly or call the retrieval tool)
//!   ├── RelevanceGrader (term overlap by default, or GraderAgent)
//!   ├── RewriteAgent    (reformulate the original question)
//!   └── AnswerAgent     (answer from retrieved context)
//! ```
//!
//! All agents call the model through the [`LlmProvider`] trait, backed by
//! OpenAI-compatible APIs (OpenAI or Azure OpenAI).

pub mod client;
pub mod config;
pub mod generator;
pub mod grader;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod rewriter;
pub mod router;
pub mod tool;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types
pub use client::create_provider;
pub use config::{AgentConfig, GraderKind, RewriteLimitPolicy, RewriteMode};
pub use generator::AnswerAgent;
pub use grader::{Grade, GraderAgent, ModelGrader, RelevanceGrader, TermOverlapGrader, create_grader};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use rewriter::{RewriteAgent, apply_human_rewrite};
pub use router::RouterAgent;
pub use tool::{ToolCall, ToolDefinition, ToolResult};
pub use traits::{Agent, AgentResponse};
