//! Prompt templates and builders for agents.
//!
//! Templates use `{question}` and `{context}` placeholders. Builders
//! substitute them in a single pass, so placeholder-like text inside a
//! question or passage is never expanded a second time.

use std::path::{Path, PathBuf};

/// Prompt asking the model to reformulate a question.
pub const REWRITE_PROMPT: &str = "Look at the input and try to reason about the underlying \
semantic intent / meaning.
Here is the initial question:
 -------
{question}
 -------
Formulate an improved question:";

/// Prompt constraining the final answer to the retrieved context.
pub const ANSWER_PROMPT: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, just say that you don't know. \
Use three sentences maximum and keep the answer concise.
Question: {question}
Context: {context}";

/// Prompt asking the model for a binary relevance judgement.
pub const GRADE_PROMPT: &str = "You are a grader assessing relevance of a retrieved document \
to a user question.
Here is the retrieved document:

{context}

Here is the user question: {question}
If the document contains keyword(s) or semantic meaning related to the user question, \
grade it as relevant.
Give a binary score 'yes' or 'no' to indicate whether the document is relevant to the \
question. Reply with the single word only.";

/// Default prompt directory relative to the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/agentic-rag/prompts";
/// Filename for the decision-step system prompt (no compiled-in default).
const DECIDE_FILENAME: &str = "decide.md";
/// Filename for the rewrite prompt template.
const REWRITE_FILENAME: &str = "rewrite.md";
/// Filename for the answer prompt template.
const ANSWER_FILENAME: &str = "answer.md";
/// Filename for the grading prompt template.
const GRADE_FILENAME: &str = "grade.md";

/// The prompt templates used by one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// Optional system prompt prepended to decision-step requests.
    pub decide: Option<String>,
    /// Rewrite template (`{question}`).
    pub rewrite: String,
    /// Answer template (`{question}`, `{context}`).
    pub answer: String,
    /// Grading template (`{question}`, `{context}`).
    pub grade: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument (from `--prompt-dir` CLI flag)
    /// 2. `RAG_PROMPT_DIR` environment variable
    /// 3. `~/.config/agentic-rag/prompts/`
    ///
    /// Each file is loaded independently — a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("RAG_PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let read = |filename: &str| -> Option<String> {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(path).ok())
                .filter(|s| !s.trim().is_empty())
        };

        Self {
            decide: read(DECIDE_FILENAME),
            rewrite: read(REWRITE_FILENAME).unwrap_or_else(|| REWRITE_PROMPT.to_string()),
            answer: read(ANSWER_FILENAME).unwrap_or_else(|| ANSWER_PROMPT.to_string()),
            grade: read(GRADE_FILENAME).unwrap_or_else(|| GRADE_PROMPT.to_string()),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            decide: None,
            rewrite: REWRITE_PROMPT.to_string(),
            answer: ANSWER_PROMPT.to_string(),
            grade: GRADE_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten — use this for initial scaffolding only.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let templates = [
            (REWRITE_FILENAME, REWRITE_PROMPT),
            (ANSWER_FILENAME, ANSWER_PROMPT),
            (GRADE_FILENAME, GRADE_PROMPT),
        ];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Substitutes `{question}` and `{context}` in one pass.
fn render(template: &str, question: &str, context: &str) -> String {
    template
        .split("{question}")
        .map(|part| part.replace("{context}", context))
        .collect::<Vec<_>>()
        .join(question)
}

/// Builds the rewrite instruction for the original question.
#[must_use]
pub fn build_rewrite_prompt(template: &str, question: &str) -> String {
    render(template, question, "")
}

/// Builds the grounded-answer prompt.
#[must_use]
pub fn build_answer_prompt(template: &str, question: &str, context: &str) -> String {
    render(template, question, context)
}

/// Builds the binary relevance-grading prompt.
#[must_use]
pub fn build_grade_prompt(template: &str, question: &str, context: &str) -> String {
    render(template, question, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_answer_prompt() {
        let prompt = build_answer_prompt(
            ANSWER_PROMPT,
            "What is reward hacking?",
            "Reward hacking occurs when an agent exploits flaws.",
        );
        assert!(prompt.contains("Question: What is reward hacking?"));
        assert!(prompt.contains("Context: Reward hacking occurs when an agent exploits flaws."));
        assert!(prompt.contains("three sentences maximum"));
        assert!(prompt.contains("just say that you don't know"));
    }

    #[test]
    fn test_build_rewrite_prompt() {
        let prompt = build_rewrite_prompt(REWRITE_PROMPT, "reward hacking?");
        assert!(prompt.contains("\nreward hacking?\n"));
        assert!(prompt.ends_with("Formulate an improved question:"));
    }

    #[test]
    fn test_render_is_single_pass() {
        let prompt = build_answer_prompt(ANSWER_PROMPT, "what is {context}?", "ctx");
        assert!(prompt.contains("Question: what is {context}?"));
        assert!(prompt.contains("Context: ctx"));
    }

    #[test]
    fn test_load_falls_back_per_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("answer.md"), "Q={question} C={context}")
            .unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("decide.md"), "Use the tool for AI questions.")
            .unwrap_or_else(|_| unreachable!());

        let prompts = PromptSet::load(Some(dir.path()));
        assert_eq!(prompts.answer, "Q={question} C={context}");
        assert_eq!(prompts.rewrite, REWRITE_PROMPT);
        assert_eq!(prompts.decide.as_deref(), Some("Use the tool for AI questions."));
    }

    #[test]
    fn test_write_defaults_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("rewrite.md"), "custom")
            .unwrap_or_else(|_| unreachable!());

        let written = PromptSet::write_defaults(dir.path()).unwrap_or_default();
        assert_eq!(written.len(), 2);
        let kept = std::fs::read_to_string(dir.path().join("rewrite.md")).unwrap_or_default();
        assert_eq!(kept, "custom");
    }
}
