//! CLI layer for agentic-rag.
//!
//! Provides the command-line interface using clap, with commands for
//! asking questions, resuming paused runs, and managing checkpoints.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{CheckpointCommands, Cli, Commands, RunArgs};
