//! Persistence for suspended runs.
//!
//! The orchestrator only produces and consumes [`Checkpoint`] values; the
//! store lets a later process pick up a run that paused for a human
//! rewrite.

mod sqlite;

pub use sqlite::SqliteCheckpointStore;

use serde::Serialize;

use crate::error::StorageError;
use crate::graph::Checkpoint;

/// Default checkpoint database path, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = ".agentic-rag/checkpoints.db";

/// Listing entry for a stored checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointSummary {
    /// Checkpoint identifier.
    pub id: String,
    /// Original question of the suspended run.
    pub question: String,
    /// Rewrites performed before suspension.
    pub rewrites: usize,
    /// Unix timestamp (seconds) when the checkpoint was stored.
    pub created_at: i64,
}

/// Storage for suspended-run checkpoints.
pub trait CheckpointStore {
    /// Stores a checkpoint, replacing any with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database or serialisation failures.
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), StorageError>;

    /// Loads a checkpoint by id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::CheckpointNotFound`] if no such checkpoint
    /// exists, or a database/serialisation error.
    fn load(&self, id: &str) -> Result<Checkpoint, StorageError>;

    /// Deletes a checkpoint. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database failures.
    fn delete(&self, id: &str) -> Result<bool, StorageError>;

    /// Lists stored checkpoints, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database failures.
    fn list(&self) -> Result<Vec<CheckpointSummary>, StorageError>;
}
