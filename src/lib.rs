//! # agentic-rag
//!
//! Retrieval-augmented question answering driven by a small, fixed state
//! machine: the model decides whether to retrieve, retrieved passages are
//! graded for relevance, irrelevant retrievals trigger a question rewrite,
//! and relevant ones are turned into a grounded answer.
//!
//! ```text
//! decide ──▶ retrieve ──▶ answer ──▶ done
//!   │  ▲         │
//!   │  └─ rewrite ◀┘
//!   └──────────────────────────▶ done
//! ```
//!
//! Rewrites are produced by the model or, in human mode, supplied by a
//! person: the run suspends with a serialisable [`Checkpoint`] and is
//! continued through [`Orchestrator::resume`].
//!
//! ## Modules
//!
//! - [`agent`]: model-facing agents, providers, prompts and graders
//! - [`retrieval`]: the retriever collaborator and its tool adapter
//! - [`graph`]: nodes, routing and the orchestrator
//! - [`storage`]: `SQLite` persistence for suspended runs
//! - [`cli`]: the `agentic-rag` command line
//! - [`error`]: error types

pub mod agent;
pub mod cli;
pub mod error;
pub mod graph;
pub mod retrieval;
pub mod storage;

pub use agent::{AgentConfig, LlmProvider, PromptSet, RelevanceGrader, create_provider};
pub use error::{AgentError, CommandError, Error, Result, StorageError};
pub use graph::{Checkpoint, Conversation, Node, Orchestrator, RunError, RunEvent, RunOutcome, RunReport, StepEvent};
pub use retrieval::{MemoryIndex, Passage, RetrievalTool, Retriever};
pub use storage::{CheckpointStore, SqliteCheckpointStore};
