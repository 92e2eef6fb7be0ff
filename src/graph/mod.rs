//! Conversation run graph.
//!
//! A run starts at `decide` with one user message and moves through a fixed
//! topology until it reaches `done`, fails, or suspends before a human
//! rewrite. Routing decisions are plain values mapped to nodes by
//! [`next_node`]; the [`Orchestrator`] executes the nodes.

pub mod checkpoint;
pub mod node;
pub mod orchestrator;
pub mod outcome;
pub mod state;

pub use checkpoint::Checkpoint;
pub use node::{Node, Route, next_node};
pub use orchestrator::Orchestrator;
pub use outcome::{RunError, RunEvent, RunOutcome, RunReport, StepEvent};
pub use state::Conversation;
