//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Agentic RAG: retrieval-augmented question answering with a
/// decide/retrieve/grade/rewrite loop.
///
/// Answers questions against a pre-chunked passage corpus, rewriting the
/// question when retrieved passages are not relevant. Runs can pause for a
/// human rewrite and be resumed later.
#[derive(Parser, Debug)]
#[command(name = "agentic-rag")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the checkpoint database file.
    ///
    /// Defaults to `.agentic-rag/checkpoints.db` in the current directory.
    #[arg(short, long, env = "RAG_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by commands that drive a run.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// JSON corpus file: an array of `{ "id"?, "source"?, "text" }` passages.
    #[arg(short, long, env = "RAG_CORPUS")]
    pub corpus: PathBuf,

    /// Print each graph step as it completes.
    #[arg(long)]
    pub stream: bool,

    /// Maximum rewrites per run.
    #[arg(long)]
    pub max_rewrites: Option<usize>,

    /// What to do when the rewrite ceiling is reached (fail, answer-anyway).
    #[arg(long)]
    pub on_limit: Option<String>,

    /// Relevance grader (overlap, model).
    #[arg(long)]
    pub grader: Option<String>,

    /// Passages returned per retrieval.
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Model used by every agent.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Directory containing prompt template files.
    #[arg(long)]
    pub prompt_dir: Option<PathBuf>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question against a passage corpus.
    ///
    /// The model either answers directly or retrieves passages. Irrelevant
    /// passages trigger a rewrite of the question; with `--human` the run
    /// pauses instead and prints a checkpoint id for `resume`.
    #[command(after_help = r#"Examples:
  agentic-rag ask "What does Lilian Weng say about reward hacking?" --corpus posts.json
  agentic-rag ask "Hello!" --corpus posts.json                  # Answers directly
  agentic-rag ask "types of reward hacking" -c posts.json --human
  agentic-rag ask "hallucination" -c posts.json --grader model --stream
  agentic-rag --format json ask "video diffusion" -c posts.json | jq '.answer'
  OPENAI_API_KEY=sk-... agentic-rag ask "..." -c posts.json --max-rewrites 1 --on-limit answer-anyway
"#)]
    Ask {
        /// The question to answer.
        question: String,

        /// Pause for a human rewrite instead of rewriting automatically.
        #[arg(long)]
        human: bool,

        /// Run options.
        #[command(flatten)]
        run: RunArgs,
    },

    /// Resume a run paused for a human rewrite.
    ///
    /// A leading `Human rewrite:` marker on the replacement is stripped.
    #[command(after_help = r#"Examples:
  agentic-rag checkpoint list
  agentic-rag resume 3f2a... "What are the types of reward hacking?" --corpus posts.json
  agentic-rag resume 3f2a... "Human rewrite: reward tampering" -c posts.json --stream
"#)]
    Resume {
        /// Checkpoint ID.
        id: String,

        /// Replacement question.
        replacement: String,

        /// Run options.
        #[command(flatten)]
        run: RunArgs,
    },

    /// Checkpoint operations (list, show, delete).
    #[command(subcommand)]
    Checkpoint(CheckpointCommands),

    /// Grade content against a question with the term-overlap grader.
    ///
    /// Runs offline; no model is called.
    #[command(after_help = r#"Examples:
  agentic-rag grade "What is reward hacking?" "Reward hacking is what happens when..."
  agentic-rag grade "cats" "dogs" --min-overlap 1
"#)]
    Grade {
        /// The question.
        question: String,

        /// Retrieved content to grade.
        content: String,

        /// Shared terms required for a relevant grade.
        #[arg(long, default_value_t = crate::agent::grader::DEFAULT_MIN_OVERLAP)]
        min_overlap: usize,

        /// Content length above which content is always relevant.
        #[arg(long, default_value_t = crate::agent::grader::DEFAULT_LENGTH_OVERRIDE)]
        length_override: usize,
    },

    /// Write default prompt templates for customization.
    ///
    /// Existing files are never overwritten.
    #[command(after_help = r#"Examples:
  agentic-rag init-prompts                  # ~/.config/agentic-rag/prompts
  agentic-rag init-prompts ./prompts        # Custom directory
"#)]
    InitPrompts {
        /// Target directory (defaults to `~/.config/agentic-rag/prompts`).
        dir: Option<PathBuf>,
    },
}

/// Checkpoint subcommands.
#[derive(Subcommand, Debug)]
pub enum CheckpointCommands {
    /// List stored checkpoints, newest first.
    #[command(alias = "ls")]
    List,

    /// Show a checkpoint's conversation.
    Show {
        /// Checkpoint ID.
        id: String,
    },

    /// Delete a checkpoint.
    #[command(alias = "rm")]
    Delete {
        /// Checkpoint ID.
        id: String,
    },
}

impl Cli {
    /// Returns the database path, using default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::storage::DEFAULT_DB_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_db_path() {
        let cli = Cli {
            db_path: None,
            verbose: false,
            format: "text".to_string(),
            command: Commands::Checkpoint(CheckpointCommands::List),
        };
        assert_eq!(
            cli.get_db_path(),
            PathBuf::from(crate::storage::DEFAULT_DB_PATH)
        );
    }

    #[test]
    fn test_custom_db_path() {
        let cli = Cli {
            db_path: Some(PathBuf::from("/custom/path.db")),
            verbose: false,
            format: "text".to_string(),
            command: Commands::Checkpoint(CheckpointCommands::List),
        };
        assert_eq!(cli.get_db_path(), PathBuf::from("/custom/path.db"));
    }

    #[test]
    fn test_ask_flags() {
        let cli = Cli::try_parse_from([
            "agentic-rag",
            "ask",
            "What is reward hacking?",
            "--corpus",
            "posts.json",
            "--human",
            "--max-rewrites",
            "1",
            "-k",
            "2",
        ])
        .unwrap_or_else(|_| unreachable!());
        let Commands::Ask { question, human, run } = cli.command else {
            unreachable!()
        };
        assert_eq!(question, "What is reward hacking?");
        assert!(human);
        assert_eq!(run.corpus, PathBuf::from("posts.json"));
        assert_eq!(run.max_rewrites, Some(1));
        assert_eq!(run.top_k, Some(2));
        assert!(!run.stream);
    }

    #[test]
    fn test_checkpoint_subcommands() {
        let cli = Cli::try_parse_from(["agentic-rag", "checkpoint", "rm", "abc"])
            .unwrap_or_else(|_| unreachable!());
        assert!(matches!(
            cli.command,
            Commands::Checkpoint(CheckpointCommands::Delete { ref id }) if id == "abc"
        ));
    }
}
