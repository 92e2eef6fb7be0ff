//! Resumable snapshot of a suspended run.

use serde::{Deserialize, Serialize};

use super::node::Node;
use super::state::Conversation;

/// Everything needed to continue a run that paused before a node.
///
/// Produced when a run suspends for a human rewrite. Serialises to JSON so
/// it can be persisted and resumed by a later process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Opaque identifier.
    pub id: String,
    /// Conversation at the moment of suspension.
    pub conversation: Conversation,
    /// Node the run will enter on resume.
    pub pending: Node,
    /// Rewrites performed before suspension.
    pub rewrites: usize,
    /// Nodes entered so far.
    pub trace: Vec<Node>,
}

impl Checkpoint {
    /// Creates a checkpoint with a fresh identifier.
    #[must_use]
    pub fn new(conversation: Conversation, pending: Node, rewrites: usize, trace: Vec<Node>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            conversation,
            pending,
            rewrites,
            trace,
        }
    }

    /// The original question of the suspended run.
    #[must_use]
    pub fn question(&self) -> &str {
        self.conversation.question()
    }

    /// Retrieved content that was graded not relevant, if any.
    #[must_use]
    pub fn rejected_context(&self) -> Option<&str> {
        self.conversation.latest_context()
    }
}
