//! What a run hands back to its caller.

use serde::{Deserialize, Serialize};

use super::checkpoint::Checkpoint;
use super::node::Node;
use super::state::Conversation;
use crate::agent::message::ChatMessage;
use crate::error::AgentError;

/// Final state of a run that reached [`Node::Done`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Full conversation; the last message is the answer.
    pub conversation: Conversation,
    /// Nodes entered, in order.
    pub trace: Vec<Node>,
    /// Rewrites performed.
    pub rewrites: usize,
}

impl RunReport {
    /// Text of the final message.
    #[must_use]
    pub fn answer(&self) -> &str {
        self.conversation.last().map_or("", |m| m.content.as_str())
    }

    /// Whether any retrieval happened.
    #[must_use]
    pub fn retrieved(&self) -> bool {
        self.trace.contains(&Node::Retrieve)
    }
}

/// Result of driving a run until it stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run reached [`Node::Done`].
    Completed(RunReport),
    /// The run paused before a node and must be resumed.
    Suspended(Checkpoint),
}

impl RunOutcome {
    /// Returns `true` if the run is waiting for a human.
    #[must_use]
    pub const fn is_suspended(&self) -> bool {
        matches!(self, Self::Suspended(_))
    }

    /// The conversation in either state.
    #[must_use]
    pub const fn conversation(&self) -> &Conversation {
        match self {
            Self::Completed(report) => &report.conversation,
            Self::Suspended(checkpoint) => &checkpoint.conversation,
        }
    }
}

/// Messages a single node appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepEvent {
    /// Node that ran.
    pub node: Node,
    /// Messages it appended (may be empty for [`Node::Done`]).
    pub appended: Vec<ChatMessage>,
}

/// Item yielded by a streamed run.
#[derive(Debug)]
pub enum RunEvent {
    /// A node finished.
    Step(StepEvent),
    /// The run completed; always the last item on success.
    Completed(RunReport),
    /// The run suspended; always the last item when it pauses.
    Suspended(Checkpoint),
    /// The run failed; always the last item on failure.
    Failed(RunError),
}

/// A failed run, with the state it had reached.
#[derive(Debug, thiserror::Error)]
#[error("run failed in {node}: {source}")]
pub struct RunError {
    /// Node in which the failure happened.
    pub node: Node,
    /// Conversation at the time of failure.
    pub conversation: Conversation,
    /// Rewrites performed before the failure.
    pub rewrites: usize,
    /// Nodes entered, including the failing one.
    pub trace: Vec<Node>,
    /// Underlying cause.
    #[source]
    pub source: AgentError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::assistant_message;

    #[test]
    fn test_report_answer_is_last_message() {
        let mut conversation = Conversation::new("hello");
        conversation.push(assistant_message("Hi!"));
        let report = RunReport {
            conversation,
            trace: vec![Node::Decide, Node::Done],
            rewrites: 0,
        };
        assert_eq!(report.answer(), "Hi!");
        assert!(!report.retrieved());
    }

    #[test]
    fn test_run_error_display_names_node() {
        let err = RunError {
            node: Node::Retrieve,
            conversation: Conversation::new("q"),
            rewrites: 0,
            trace: vec![Node::Decide, Node::Retrieve],
            source: AgentError::MalformedToolCall {
                name: "retrieve_blog_posts".to_string(),
                message: "invalid arguments".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("retrieve"));
        assert!(msg.contains("malformed tool call"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
