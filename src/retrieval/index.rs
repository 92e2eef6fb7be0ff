//! In-memory BM25 index over pre-chunked passages.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use super::{Passage, Retriever, ScoredPassage};
use crate::error::{AgentError, StorageError};

/// BM25 term-frequency saturation.
const BM25_K1: f64 = 1.2;
/// BM25 length normalisation.
const BM25_B: f64 = 0.75;

/// Read-only BM25 index.
///
/// Built once from passages and shared behind an `Arc` by every run.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    passages: Vec<Passage>,
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<usize>,
    doc_freqs: HashMap<String, usize>,
    avg_doc_len: f64,
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.unicode_words().map(str::to_lowercase)
}

impl MemoryIndex {
    /// Builds an index from passages.
    ///
    /// Passages with blank text are dropped; blank IDs are replaced by
    /// `p{position}`.
    #[must_use]
    pub fn new(passages: Vec<Passage>) -> Self {
        let passages: Vec<Passage> = passages
            .into_iter()
            .filter(|p| !p.text.trim().is_empty())
            .enumerate()
            .map(|(i, mut p)| {
                if p.id.trim().is_empty() {
                    p.id = format!("p{i}");
                }
                p
            })
            .collect();

        let mut term_freqs = Vec::with_capacity(passages.len());
        let mut doc_lens = Vec::with_capacity(passages.len());
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();

        for passage in &passages {
            let mut tf: HashMap<String, u32> = HashMap::new();
            let mut len = 0;
            for term in tokenize(&passage.text) {
                *tf.entry(term).or_insert(0) += 1;
                len += 1;
            }
            for term in tf.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(tf);
            doc_lens.push(len);
        }

        #[allow(clippy::cast_precision_loss)]
        let avg_doc_len = if doc_lens.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<usize>() as f64 / doc_lens.len() as f64
        };

        Self {
            passages,
            term_freqs,
            doc_lens,
            doc_freqs,
            avg_doc_len,
        }
    }

    /// Parses a JSON array of passages.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the input is not an array of
    /// `{ "id"?, "source"?, "text" }` objects.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let passages: Vec<Passage> = serde_json::from_str(json)?;
        Ok(Self::new(passages))
    }

    /// Loads a JSON corpus file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on I/O or parse failures.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    /// Number of indexed passages.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.passages.len()
    }

    /// Returns `true` if no passages are indexed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Scores every passage against `query` and returns the best `top_k`.
    ///
    /// Passages sharing no term with the query are not returned.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn search(&self, query: &str, top_k: usize) -> Vec<ScoredPassage> {
        let mut terms: Vec<String> = tokenize(query).collect();
        terms.sort_unstable();
        terms.dedup();

        let n = self.passages.len() as f64;
        let mut scored: Vec<(usize, f64)> = self
            .term_freqs
            .iter()
            .enumerate()
            .filter_map(|(doc, tf)| {
                let len_norm = if self.avg_doc_len > 0.0 {
                    self.doc_lens[doc] as f64 / self.avg_doc_len
                } else {
                    1.0
                };
                let score: f64 = terms
                    .iter()
                    .filter_map(|term| {
                        let freq = f64::from(*tf.get(term)?);
                        let df = *self.doc_freqs.get(term)? as f64;
                        let idf = ((n - df + 0.5) / (df + 0.5)).ln_1p();
                        Some(
                            idf * freq * (BM25_K1 + 1.0)
                                / BM25_B.mul_add(len_norm, 1.0 - BM25_B).mul_add(BM25_K1, freq),
                        )
                    })
                    .sum();
                (score > 0.0).then_some((doc, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(doc, score)| ScoredPassage {
                passage: self.passages[doc].clone(),
                score,
            })
            .collect()
    }
}

#[async_trait]
impl Retriever for MemoryIndex {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredPassage>, AgentError> {
        if self.is_empty() {
            return Err(AgentError::RetrievalFailure {
                message: "index is empty".to_string(),
            });
        }
        let results = self.search(query, top_k);
        debug!(query, hits = results.len(), "bm25 retrieval");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str, text: &str) -> Passage {
        Passage {
            id: id.to_string(),
            source: None,
            text: text.to_string(),
        }
    }

    fn index() -> MemoryIndex {
        MemoryIndex::new(vec![
            passage(
                "reward",
                "Reward hacking occurs when a reinforcement learning agent exploits flaws \
                 in the reward function to achieve high reward without the intended behavior.",
            ),
            passage(
                "halluc",
                "Hallucination in large language models refers to generating unfaithful, \
                 fabricated or nonsensical content.",
            ),
            passage(
                "video",
                "Diffusion models for video generation extend image diffusion with temporal layers.",
            ),
        ])
    }

    #[test]
    fn test_search_ranks_matching_passage_first() {
        let results = index().search("What is reward hacking?", 4);
        assert!(!results.is_empty());
        assert_eq!(results[0].passage.id, "reward");
        assert!(results.iter().all(|r| r.score > 0.0));
    }

    #[test]
    fn test_search_excludes_non_matching() {
        let results = index().search("zebra crossing", 4);
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_respects_top_k() {
        let results = index().search("models diffusion hallucination reward", 1);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_blank_passages_dropped_and_ids_assigned() {
        let idx = MemoryIndex::new(vec![passage("", "first text"), passage("x", "  ")]);
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.search("first", 1)[0].passage.id, "p0");
    }

    #[test]
    fn test_from_json() {
        let idx = MemoryIndex::from_json(
            r#"[{"text": "Reward hacking"}, {"id": "b", "source": "https://example.com", "text": "Other"}]"#,
        )
        .unwrap_or_default();
        assert_eq!(idx.len(), 2);
        assert!(MemoryIndex::from_json(r#"{"text": "not an array"}"#).is_err());
    }

    #[tokio::test]
    async fn test_empty_index_is_retrieval_failure() {
        let idx = MemoryIndex::default();
        let result = idx.retrieve("anything", 4).await;
        assert!(matches!(result, Err(AgentError::RetrievalFailure { .. })));
    }
}
