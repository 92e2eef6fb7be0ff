//! Mock provider shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use super::provider::LlmProvider;
use super::tool::ToolCall;
use crate::error::AgentError;

type Handler = Box<dyn Fn(&ChatRequest) -> Result<ChatResponse, AgentError> + Send + Sync>;

/// Provider whose replies are computed by a closure over the request.
///
/// Records every request and counts calls so tests can assert on what the
/// model was sent.
pub struct MockProvider {
    handler: Handler,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<ChatResponse, AgentError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always replies with the given text.
    pub fn text(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(text_response(&reply)))
    }

    /// Always fails as if the model were unreachable.
    pub fn unavailable() -> Self {
        Self::new(|_| {
            Err(AgentError::ModelUnavailable {
                message: "connection refused".to_string(),
                status: None,
            })
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests().pop()
    }
}

pub fn text_response(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.to_string(),
        finish_reason: Some("stop".to_string()),
        ..ChatResponse::default()
    }
}

pub fn tool_call_response(name: &str, arguments: &str) -> ChatResponse {
    ChatResponse {
        tool_calls: vec![ToolCall {
            id: "call_0".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }],
        finish_reason: Some("tool_calls".to_string()),
        ..ChatResponse::default()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        (self.handler)(request)
    }
}
