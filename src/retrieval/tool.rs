//! Retrieval exposed as a model-invokable tool.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use super::Retriever;
use crate::agent::config::AgentConfig;
use crate::agent::tool::{ToolCall, ToolDefinition, ToolResult};
use crate::error::AgentError;

/// Maximum raw byte length of tool argument JSON from the LLM.
const MAX_TOOL_ARGS_LEN: usize = 100_000;
/// Separator between passages in the tool result.
const PASSAGE_SEPARATOR: &str = "\n\n";

/// Adapter exposing a [`Retriever`] under a tool name.
///
/// Holds no per-run state; cloning shares the underlying retriever.
#[derive(Clone)]
pub struct RetrievalTool {
    retriever: Arc<dyn Retriever>,
    definition: ToolDefinition,
    top_k: usize,
}

impl std::fmt::Debug for RetrievalTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalTool")
            .field("name", &self.definition.name)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl RetrievalTool {
    /// Creates a tool with an explicit name, description and passage count.
    #[must_use]
    pub fn new(
        retriever: Arc<dyn Retriever>,
        name: impl Into<String>,
        description: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            definition: ToolDefinition::query_tool(name, description),
            top_k: top_k.max(1),
        }
    }

    /// Creates a tool from the configured name, description and `top_k`.
    #[must_use]
    pub fn from_config(retriever: Arc<dyn Retriever>, config: &AgentConfig) -> Self {
        Self::new(
            retriever,
            config.tool_name.clone(),
            config.tool_description.clone(),
            config.top_k,
        )
    }

    /// Name the model invokes the tool by.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Definition sent to the model.
    #[must_use]
    pub const fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Validates a call without executing it.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MalformedToolCall`] for an unknown tool name,
    /// oversized or unparsable arguments, or a missing/blank `query`.
    pub fn parse_query(&self, call: &ToolCall) -> Result<String, AgentError> {
        #[derive(Deserialize)]
        struct Args {
            query: String,
        }

        let malformed = |message: String| AgentError::MalformedToolCall {
            name: call.name.clone(),
            message,
        };

        if call.name != self.definition.name {
            return Err(malformed(format!(
                "unknown tool (expected `{}`)",
                self.definition.name
            )));
        }
        if call.arguments.len() > MAX_TOOL_ARGS_LEN {
            return Err(malformed(format!(
                "tool arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                call.arguments.len()
            )));
        }

        let args: Args = serde_json::from_str(&call.arguments)
            .map_err(|e| malformed(format!("invalid arguments: {e}")))?;
        if args.query.trim().is_empty() {
            return Err(malformed("query must not be empty".to_string()));
        }
        Ok(args.query)
    }

    /// Executes a tool call.
    ///
    /// Retrieval failures do not fail the call: they are logged and produce
    /// an empty, error-flagged result so the run can grade and rewrite.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MalformedToolCall`] as for [`Self::parse_query`].
    pub async fn invoke(&self, call: &ToolCall) -> Result<ToolResult, AgentError> {
        let query = self.parse_query(call)?;

        match self.retriever.retrieve(&query, self.top_k).await {
            Ok(passages) => {
                debug!(
                    tool = %self.definition.name,
                    call_id = %call.id,
                    passages = passages.len(),
                    "retrieval complete"
                );
                let content = passages
                    .iter()
                    .map(|p| p.passage.text.as_str())
                    .collect::<Vec<_>>()
                    .join(PASSAGE_SEPARATOR);
                Ok(ToolResult {
                    tool_call_id: call.id.clone(),
                    content,
                    is_error: false,
                })
            }
            Err(e) => {
                warn!(tool = %self.definition.name, call_id = %call.id, error = %e, "retrieval failed");
                Ok(ToolResult {
                    tool_call_id: call.id.clone(),
                    content: String::new(),
                    is_error: true,
                })
            }
        }
    }
}
