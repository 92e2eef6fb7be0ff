//! `SQLite` checkpoint store.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use super::{CheckpointStore, CheckpointSummary};
use crate::error::StorageError;
use crate::graph::Checkpoint;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS checkpoints (
    id TEXT PRIMARY KEY,
    question TEXT NOT NULL,
    rewrites INTEGER NOT NULL,
    payload TEXT NOT NULL,
    created_at INTEGER NOT NULL
)";

/// Checkpoints stored as JSON payloads in a single `SQLite` table.
pub struct SqliteCheckpointStore {
    conn: Connection,
}

impl SqliteCheckpointStore {
    /// Opens (creating if needed) the database at `path`.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory or database cannot be
    /// created.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.init()?;
        debug!(path = %path.display(), "opened checkpoint store");
        Ok(store)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the schema cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<(), StorageError> {
        self.conn.execute(SCHEMA, [])?;
        Ok(())
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

impl CheckpointStore for SqliteCheckpointStore {
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), StorageError> {
        let payload = serde_json::to_string(checkpoint)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO checkpoints (id, question, rewrites, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                checkpoint.id,
                checkpoint.question(),
                i64::try_from(checkpoint.rewrites).unwrap_or(i64::MAX),
                payload,
                now_secs(),
            ],
        )?;
        debug!(id = %checkpoint.id, "saved checkpoint");
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Checkpoint, StorageError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM checkpoints WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let payload = payload.ok_or_else(|| StorageError::CheckpointNotFound { id: id.to_string() })?;
        Ok(serde_json::from_str(&payload)?)
    }

    fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let removed = self
            .conn
            .execute("DELETE FROM checkpoints WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn list(&self) -> Result<Vec<CheckpointSummary>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, question, rewrites, created_at FROM checkpoints
             ORDER BY created_at DESC, id",
        )?;
        let rows = stmt.query_map([], |row| {
            let rewrites: i64 = row.get(2)?;
            Ok(CheckpointSummary {
                id: row.get(0)?,
                question: row.get(1)?,
                rewrites: usize::try_from(rewrites).unwrap_or_default(),
                created_at: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::tool_message;
    use crate::graph::{Conversation, Node};
    use tempfile::TempDir;

    fn checkpoint(question: &str, rewrites: usize) -> Checkpoint {
        let mut conversation = Conversation::new(question);
        conversation.push(tool_message("call_0", "Unrelated note."));
        Checkpoint::new(
            conversation,
            Node::Rewrite,
            rewrites,
            vec![Node::Decide, Node::Retrieve],
        )
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = SqliteCheckpointStore::in_memory().unwrap_or_else(|_| unreachable!());
        let cp = checkpoint("What is reward hacking?", 1);
        store.save(&cp).unwrap_or_else(|_| unreachable!());

        let loaded = store.load(&cp.id).unwrap_or_else(|_| unreachable!());
        assert_eq!(loaded, cp);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let store = SqliteCheckpointStore::in_memory().unwrap_or_else(|_| unreachable!());
        let result = store.load("nope");
        assert!(matches!(result, Err(StorageError::CheckpointNotFound { .. })));
    }

    #[test]
    fn test_delete_and_list() {
        let store = SqliteCheckpointStore::in_memory().unwrap_or_else(|_| unreachable!());
        let a = checkpoint("first question", 0);
        let b = checkpoint("second question", 2);
        store.save(&a).unwrap_or_else(|_| unreachable!());
        store.save(&b).unwrap_or_else(|_| unreachable!());

        let listed = store.list().unwrap_or_default();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|s| s.id == b.id && s.rewrites == 2));

        assert!(store.delete(&a.id).unwrap_or(false));
        assert!(!store.delete(&a.id).unwrap_or(true));
        assert_eq!(store.list().unwrap_or_default().len(), 1);
    }

    #[test]
    fn test_open_creates_parent_dirs_and_persists() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let path = dir.path().join("nested").join("checkpoints.db");
        let cp = checkpoint("persisted", 0);
        {
            let store = SqliteCheckpointStore::open(&path).unwrap_or_else(|_| unreachable!());
            store.save(&cp).unwrap_or_else(|_| unreachable!());
        }
        let reopened = SqliteCheckpointStore::open(&path).unwrap_or_else(|_| unreachable!());
        assert_eq!(reopened.load(&cp.id).map(|c| c.id).unwrap_or_default(), cp.id);
    }
}
