//! Retrieval collaborator and its tool adapter.
//!
//! The index is built ahead of time by an ingestion pipeline outside this
//! crate. [`MemoryIndex`] loads such pre-chunked passages and answers
//! queries with BM25; anything else implementing [`Retriever`] (a remote
//! vector store, for instance) plugs into [`RetrievalTool`] the same way.

pub mod index;
pub mod tool;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

pub use index::MemoryIndex;
pub use tool::RetrievalTool;

/// A pre-chunked passage of source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage identifier; assigned from position when absent in the corpus.
    #[serde(default)]
    pub id: String,
    /// Where the passage came from (URL, file path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Passage text.
    pub text: String,
}

/// A passage returned for a query, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    /// The matching passage.
    pub passage: Passage,
    /// Similarity score (higher is better).
    pub score: f64,
}

/// Read-only similarity lookup over a pre-built index.
///
/// Implementations must be safe to call repeatedly and concurrently.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns up to `top_k` passages ranked by similarity to `query`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::RetrievalFailure`] if the index cannot answer.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredPassage>, AgentError>;
}
