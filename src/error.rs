//! Error types for agentic-rag.
//!
//! Agent and collaborator failures are [`AgentError`]; checkpoint persistence
//! failures are [`StorageError`]; CLI failures are [`CommandError`]. The
//! crate-level [`Error`] unifies them for the command layer.

use thiserror::Error;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the command layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Agent or orchestration failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Checkpoint storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Command execution failure.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Errors raised by agents, providers, and the retrieval collaborator.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key was found in configuration or the environment.
    #[error("API key not configured (set OPENAI_API_KEY, AZURE_OPENAI_API_KEY or RAG_API_KEY)")]
    ApiKeyMissing,

    /// A provider-specific setting is required but missing.
    #[error("missing configuration value: {name}")]
    ConfigMissing {
        /// Name of the missing setting.
        name: String,
    },

    /// The configured provider name is not known.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name as configured.
        name: String,
    },

    /// The language model is unreachable or returned an error.
    #[error("model unavailable: {message}")]
    ModelUnavailable {
        /// Provider error message.
        message: String,
        /// HTTP status, when the provider reported one.
        status: Option<u16>,
    },

    /// The model requested an unknown tool or sent unusable arguments.
    #[error("malformed tool call `{name}`: {message}")]
    MalformedToolCall {
        /// Tool name as requested by the model.
        name: String,
        /// What was wrong with the call.
        message: String,
    },

    /// The retrieval index failed to answer a query.
    #[error("retrieval failed: {message}")]
    RetrievalFailure {
        /// Retriever error message.
        message: String,
    },

    /// The grader kept routing to rewrite past the configured ceiling.
    #[error("rewrite limit reached: retrieved content still not relevant after {max_rewrites} rewrites")]
    UnboundedRewriteLoop {
        /// The configured rewrite ceiling.
        max_rewrites: usize,
    },

    /// A checkpoint could not be resumed.
    #[error("invalid checkpoint: {message}")]
    Checkpoint {
        /// Why the checkpoint was rejected.
        message: String,
    },

    /// Any other orchestration failure.
    #[error("orchestration error: {message}")]
    Orchestration {
        /// Error message.
        message: String,
    },
}

/// Errors raised by checkpoint storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// `SQLite` error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Checkpoint payload could not be encoded or decoded.
    #[error("checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error (creating the database directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No checkpoint exists with the given ID.
    #[error("checkpoint not found: {id}")]
    CheckpointNotFound {
        /// Requested checkpoint ID.
        id: String,
    },
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Invalid argument value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The passage corpus could not be loaded.
    #[error("failed to load corpus {path}: {message}")]
    Corpus {
        /// Corpus path.
        path: String,
        /// Underlying error.
        message: String,
    },

    /// Command failed during execution.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Output could not be serialized.
    #[error("output error: {0}")]
    Output(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_display() {
        let err = AgentError::MalformedToolCall {
            name: "search_web".to_string(),
            message: "unknown tool".to_string(),
        };
        assert_eq!(err.to_string(), "malformed tool call `search_web`: unknown tool");

        let err = AgentError::UnboundedRewriteLoop { max_rewrites: 3 };
        assert!(err.to_string().contains("after 3 rewrites"));
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = AgentError::ApiKeyMissing.into();
        assert!(matches!(err, Error::Agent(AgentError::ApiKeyMissing)));

        let err: Error = StorageError::CheckpointNotFound {
            id: "abc".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "checkpoint not found: abc");
    }
}
