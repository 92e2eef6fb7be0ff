//! Append-only conversation state owned by one run.

use serde::{Deserialize, Serialize};

use crate::agent::message::{ChatMessage, Role, user_message};
use crate::error::AgentError;

/// Ordered messages of one run.
///
/// The first message is always the original `user` question. Messages are
/// only ever appended; a rewrite adds a new `user` message instead of
/// editing the first one. The invariant is checked on construction and on
/// deserialisation, so a restored checkpoint cannot violate it either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ChatMessage>", into = "Vec<ChatMessage>")]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Starts a conversation from the user's question.
    #[must_use]
    pub fn new(question: &str) -> Self {
        Self {
            messages: vec![user_message(question)],
        }
    }

    /// Restores a conversation from messages.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] if the list is empty, does not
    /// start with a `user` message, or contains a `system` message.
    pub fn from_messages(messages: Vec<ChatMessage>) -> Result<Self, AgentError> {
        match messages.first() {
            None => {
                return Err(AgentError::Orchestration {
                    message: "conversation must not be empty".to_string(),
                });
            }
            Some(first) if first.role != Role::User => {
                return Err(AgentError::Orchestration {
                    message: format!("conversation must start with a user message, got {}", first.role),
                });
            }
            Some(_) => {}
        }
        if messages.iter().any(|m| m.role == Role::System) {
            return Err(AgentError::Orchestration {
                message: "system messages are not part of the conversation state".to_string(),
            });
        }
        Ok(Self { messages })
    }

    /// All messages in order.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages (at least one).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always `false`; a conversation holds at least the question.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The original question (message 0).
    #[must_use]
    pub fn question(&self) -> &str {
        self.messages.first().map_or("", |m| m.content.as_str())
    }

    /// The most recent message.
    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Content of the most recent `tool` message, if any.
    #[must_use]
    pub fn latest_context(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Tool)
            .map(|m| m.content.as_str())
    }

    /// Number of `user` messages after the original question.
    #[must_use]
    pub fn rewritten_questions(&self) -> usize {
        self.messages
            .iter()
            .skip(1)
            .filter(|m| m.role == Role::User)
            .count()
    }

    /// Appends a message.
    pub(crate) fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }
}

impl TryFrom<Vec<ChatMessage>> for Conversation {
    type Error = AgentError;

    fn try_from(messages: Vec<ChatMessage>) -> Result<Self, Self::Error> {
        Self::from_messages(messages)
    }
}

impl From<Conversation> for Vec<ChatMessage> {
    fn from(conversation: Conversation) -> Self {
        conversation.messages
    }
}
