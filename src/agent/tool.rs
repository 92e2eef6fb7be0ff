//! Tool type definitions for function-calling.
//!
//! Provides provider-agnostic types for tool definitions, calls, and results.
//! The retrieval adapter is the only tool the decision step exposes, but the
//! types carry no assumption about that.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// A tool definition that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (the model invokes the tool by this name).
    pub name: String,
    /// Human-readable description the model uses to decide when to call it.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Defines a tool taking a single required free-text `query` argument.
    #[must_use]
    pub fn query_tool(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Free-text query to look up."
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        }
    }
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// The result of executing a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this result corresponds to.
    pub tool_call_id: String,
    /// Result content. Empty when the underlying lookup failed.
    pub content: String,
    /// Whether the underlying lookup failed.
    pub is_error: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_tool_schema() {
        let def = ToolDefinition::query_tool("retrieve_blog_posts", "Search blog posts.");
        assert_eq!(def.name, "retrieve_blog_posts");
        assert!(def.parameters.is_object());
        assert_eq!(def.parameters["type"], "object");
        assert_eq!(def.parameters["required"][0], "query");
    }

    #[test]
    fn test_tool_call_serialization() {
        let call = ToolCall {
            id: "call_123".to_string(),
            name: "retrieve_blog_posts".to_string(),
            arguments: r#"{"query":"reward hacking"}"#.to_string(),
        };
        let json = serde_json::to_string(&call).unwrap_or_default();
        assert!(json.contains("call_123"));
        assert!(json.contains("retrieve_blog_posts"));
    }

    #[test]
    fn test_tool_result_serialization() {
        let result = ToolResult {
            tool_call_id: "call_123".to_string(),
            content: "Reward hacking occurs when...".to_string(),
            is_error: false,
        };
        let json = serde_json::to_string(&result).unwrap_or_default();
        assert!(json.contains("call_123"));
        assert!(!result.is_error);
    }
}
