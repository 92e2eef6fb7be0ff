//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use agentic_rag::agent::message::{ChatRequest, ChatResponse, Role};
use agentic_rag::agent::provider::LlmProvider;
use agentic_rag::agent::tool::ToolCall;
use agentic_rag::{AgentConfig, AgentError, MemoryIndex, Orchestrator, Passage, PromptSet};
use async_trait::async_trait;

pub const TOOL: &str = "retrieve_blog_posts";
pub const REWRITTEN: &str = "What are the causes of reward hacking in reinforcement learning?";

/// Deterministic stand-in for the language model.
///
/// - decision requests (tools bound): greetings get a direct reply, anything
///   else a retrieval call whose query is the latest user message
/// - rewrite prompts get [`REWRITTEN`]
/// - answer prompts get `Answer: <context>`
pub struct ScriptedProvider {
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn reply(request: &ChatRequest) -> ChatResponse {
        let last = request.messages.last().map_or("", |m| m.content.as_str());

        if !request.tools.is_empty() {
            let latest_user = request
                .messages
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map_or("", |m| m.content.as_str());
            if latest_user.to_lowercase().starts_with("hello") {
                return text("I'm doing well, thanks for asking!");
            }
            let arguments = serde_json::json!({ "query": latest_user }).to_string();
            return ChatResponse {
                tool_calls: vec![ToolCall {
                    id: format!("call_{}", request.messages.len()),
                    name: TOOL.to_string(),
                    arguments,
                }],
                finish_reason: Some("tool_calls".to_string()),
                ..ChatResponse::default()
            };
        }

        if last.starts_with("Look at the input") {
            return text(REWRITTEN);
        }
        let context = last.split_once("Context: ").map_or("", |(_, c)| c);
        text(&format!("Answer: {context}"))
    }
}

fn text(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.to_string(),
        finish_reason: Some("stop".to_string()),
        ..ChatResponse::default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::reply(request))
    }
}

pub fn index(texts: &[&str]) -> Arc<MemoryIndex> {
    Arc::new(MemoryIndex::new(
        texts
            .iter()
            .map(|text| Passage {
                id: String::new(),
                source: None,
                text: (*text).to_string(),
            })
            .collect(),
    ))
}

pub fn config() -> AgentConfig {
    AgentConfig::builder()
        .api_key("test-key")
        .build()
        .unwrap_or_else(|_| unreachable!())
}

pub fn orchestrator(
    provider: Arc<ScriptedProvider>,
    texts: &[&str],
    config: &AgentConfig,
) -> Orchestrator {
    Orchestrator::with_prompts(provider, index(texts), config, PromptSet::defaults())
}
