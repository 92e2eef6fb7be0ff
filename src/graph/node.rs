//! Nodes, routes, and the dispatch table between them.
//!
//! Decision functions produce a [`Route`]; [`next_node`] is the only place
//! that knows which [`Node`] each route leads to.

use serde::{Deserialize, Serialize};

use crate::agent::grader::Grade;
use crate::agent::message::ChatResponse;

/// A state of the run graph.
///
/// Grading has no node of its own: it is evaluated on the edge leaving
/// [`Node::Retrieve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Model decides between retrieving and answering directly.
    Decide,
    /// Retrieval tool call is executed and the result graded.
    Retrieve,
    /// Question is reformulated.
    Rewrite,
    /// Final answer is generated from retrieved context.
    Answer,
    /// Terminal state.
    Done,
}

impl Node {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Decide => "decide",
            Self::Retrieve => "retrieve",
            Self::Rewrite => "rewrite",
            Self::Answer => "answer",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing decision produced on a conditional edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// The model requested the retrieval tool.
    InvokeTool,
    /// The model answered without a tool.
    RespondDirectly,
    /// Retrieved content was graded relevant.
    AnswerFromContext,
    /// Retrieved content was graded not relevant.
    NeedRewrite,
}

/// Dispatch table: the node each route leads to.
#[must_use]
pub const fn next_node(route: Route) -> Node {
    match route {
        Route::InvokeTool => Node::Retrieve,
        Route::RespondDirectly => Node::Done,
        Route::AnswerFromContext => Node::Answer,
        Route::NeedRewrite => Node::Rewrite,
    }
}

/// Route out of [`Node::Decide`].
#[must_use]
pub fn route_decision(response: &ChatResponse) -> Route {
    if response.tool_calls.is_empty() {
        Route::RespondDirectly
    } else {
        Route::InvokeTool
    }
}

/// Route out of [`Node::Retrieve`].
#[must_use]
pub const fn route_grade(grade: Grade) -> Route {
    match grade {
        Grade::Answer => Route::AnswerFromContext,
        Grade::Rewrite => Route::NeedRewrite,
    }
}
