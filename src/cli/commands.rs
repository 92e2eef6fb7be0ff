//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

// Allow certain patterns that improve readability in CLI output formatting
#![allow(clippy::uninlined_format_args)]

use std::io::{self, Write as IoWrite};
use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

use crate::agent::client::create_provider;
use crate::agent::config::{AgentConfig, GraderKind, RewriteLimitPolicy, RewriteMode};
use crate::agent::grader::TermOverlapGrader;
use crate::agent::prompt::PromptSet;
use crate::cli::output::{
    OutputFormat, format_checkpoint, format_checkpoint_list, format_grade, format_outcome,
    format_step,
};
use crate::cli::parser::{CheckpointCommands, Cli, Commands, RunArgs};
use crate::error::{CommandError, Error, Result, StorageError};
use crate::graph::{Node, Orchestrator, RunError, RunEvent, RunOutcome};
use crate::retrieval::MemoryIndex;
use crate::storage::{CheckpointStore, SqliteCheckpointStore};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let db_path = cli.get_db_path();

    match &cli.command {
        Commands::Ask {
            question,
            human,
            run,
        } => cmd_ask(&db_path, question, *human, run, format),
        Commands::Resume {
            id,
            replacement,
            run,
        } => cmd_resume(&db_path, id, replacement, run, format),
        Commands::Checkpoint(cmd) => match cmd {
            CheckpointCommands::List => cmd_checkpoint_list(&db_path, format),
            CheckpointCommands::Show { id } => cmd_checkpoint_show(&db_path, id, format),
            CheckpointCommands::Delete { id } => cmd_checkpoint_delete(&db_path, id, format),
        },
        Commands::Grade {
            question,
            content,
            min_overlap,
            length_override,
        } => Ok(cmd_grade(
            question,
            content,
            *min_overlap,
            *length_override,
            format,
        )),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

// ==================== Run Commands ====================

/// Builds agent configuration from env + CLI overrides.
fn build_config(run: &RunArgs, mode: Option<RewriteMode>) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder().from_env();
    if let Some(mode) = mode {
        builder = builder.rewrite_mode(mode);
    }
    if let Some(n) = run.max_rewrites {
        builder = builder.max_rewrites(n);
    }
    if let Some(policy) = run.on_limit.as_deref() {
        let policy = RewriteLimitPolicy::parse(policy).ok_or_else(|| {
            CommandError::InvalidArgument(format!(
                "unknown rewrite limit policy '{policy}' (expected fail or answer-anyway)"
            ))
        })?;
        builder = builder.rewrite_limit_policy(policy);
    }
    if let Some(grader) = run.grader.as_deref() {
        let grader = GraderKind::parse(grader).ok_or_else(|| {
            CommandError::InvalidArgument(format!(
                "unknown grader '{grader}' (expected overlap or model)"
            ))
        })?;
        builder = builder.grader(grader);
    }
    if let Some(k) = run.top_k {
        builder = builder.top_k(k);
    }
    if let Some(model) = run.model.as_deref() {
        builder = builder.model(model);
    }
    if let Some(dir) = run.prompt_dir.as_deref() {
        builder = builder.prompt_dir(dir);
    }

    builder
        .build()
        .map_err(|e| CommandError::ExecutionFailed(format!("Agent configuration error: {e}")).into())
}

fn build_orchestrator(run: &RunArgs, config: &AgentConfig) -> Result<Arc<Orchestrator>> {
    let index = MemoryIndex::load(&run.corpus).map_err(|e| CommandError::Corpus {
        path: run.corpus.display().to_string(),
        message: e.to_string(),
    })?;
    if index.is_empty() {
        warn!(corpus = %run.corpus.display(), "corpus has no passages; every retrieval will grade as not relevant");
    }
    debug!(passages = index.len(), "corpus loaded");

    let provider = create_provider(config)
        .map_err(|e| CommandError::ExecutionFailed(format!("Provider creation failed: {e}")))?;

    Ok(Arc::new(Orchestrator::new(
        Arc::from(provider),
        Arc::new(index),
        config,
    )))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

fn run_failed(err: &RunError) -> Error {
    let trace: Vec<&str> = err.trace.iter().map(Node::as_str).collect();
    CommandError::ExecutionFailed(format!(
        "Run failed in {} after {} rewrite(s) (trace: {}; {} messages): {}",
        err.node,
        err.rewrites,
        trace.join(" → "),
        err.conversation.len(),
        err.source
    ))
    .into()
}

/// Prints streamed steps as they arrive and returns the terminal event.
async fn follow(
    mut events: UnboundedReceiverStream<RunEvent>,
    format: OutputFormat,
) -> Result<std::result::Result<RunOutcome, RunError>> {
    while let Some(event) = events.next().await {
        match event {
            RunEvent::Step(step) => {
                let mut stdout = io::stdout();
                stdout
                    .write_all(format_step(&step, format).as_bytes())
                    .and_then(|()| stdout.flush())
                    .map_err(|e| CommandError::Output(e.to_string()))?;
            }
            RunEvent::Completed(report) => return Ok(Ok(RunOutcome::Completed(report))),
            RunEvent::Suspended(checkpoint) => return Ok(Ok(RunOutcome::Suspended(checkpoint))),
            RunEvent::Failed(err) => return Ok(Err(err)),
        }
    }
    Err(CommandError::ExecutionFailed("Run ended without a result".to_string()).into())
}

/// Persists or clears checkpoints for an outcome, then formats it.
fn finish(
    db_path: &Path,
    outcome: &RunOutcome,
    resumed: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let needs_store = resumed.is_some() || outcome.is_suspended();
    if needs_store {
        let store = SqliteCheckpointStore::open(db_path)?;
        if let RunOutcome::Suspended(checkpoint) = outcome {
            store.save(checkpoint)?;
        }
        if let Some(id) = resumed {
            store.delete(id)?;
        }
    }
    Ok(format_outcome(outcome, format))
}

fn cmd_ask(
    db_path: &Path,
    question: &str,
    human: bool,
    run: &RunArgs,
    format: OutputFormat,
) -> Result<String> {
    if question.trim().is_empty() {
        return Err(CommandError::InvalidArgument("question must not be empty".to_string()).into());
    }
    let config = build_config(run, human.then_some(RewriteMode::Human))?;
    let orchestrator = build_orchestrator(run, &config)?;

    let rt = runtime()?;
    let result = rt.block_on(async {
        if run.stream {
            follow(orchestrator.stream(question), format).await
        } else {
            Ok(orchestrator.run(question).await)
        }
    })?;

    let outcome = result.map_err(|e| run_failed(&e))?;
    finish(db_path, &outcome, None, format)
}

fn cmd_resume(
    db_path: &Path,
    id: &str,
    replacement: &str,
    run: &RunArgs,
    format: OutputFormat,
) -> Result<String> {
    let checkpoint = SqliteCheckpointStore::open(db_path)?.load(id)?;
    let config = build_config(run, Some(RewriteMode::Human))?;
    let orchestrator = build_orchestrator(run, &config)?;

    let rt = runtime()?;
    let result = rt.block_on(async {
        if run.stream {
            follow(
                orchestrator.resume_stream(checkpoint, replacement.to_string()),
                format,
            )
            .await
        } else {
            Ok(orchestrator.resume(checkpoint, replacement).await)
        }
    })?;

    // A failed resume leaves the stored checkpoint in place.
    let outcome = result.map_err(|e| run_failed(&e))?;
    finish(db_path, &outcome, Some(id), format)
}

// ==================== Checkpoint Commands ====================

fn cmd_checkpoint_list(db_path: &Path, format: OutputFormat) -> Result<String> {
    let store = SqliteCheckpointStore::open(db_path)?;
    Ok(format_checkpoint_list(&store.list()?, format))
}

fn cmd_checkpoint_show(db_path: &Path, id: &str, format: OutputFormat) -> Result<String> {
    let store = SqliteCheckpointStore::open(db_path)?;
    Ok(format_checkpoint(&store.load(id)?, format))
}

fn cmd_checkpoint_delete(db_path: &Path, id: &str, format: OutputFormat) -> Result<String> {
    let store = SqliteCheckpointStore::open(db_path)?;
    if !store.delete(id)? {
        return Err(StorageError::CheckpointNotFound { id: id.to_string() }.into());
    }
    match format {
        OutputFormat::Text => Ok(format!("Deleted checkpoint: {id}\n")),
        OutputFormat::Json => Ok(format.to_json(&serde_json::json!({ "deleted": id }))),
    }
}

// ==================== Offline Commands ====================

fn cmd_grade(
    question: &str,
    content: &str,
    min_overlap: usize,
    length_override: usize,
    format: OutputFormat,
) -> String {
    let grader = TermOverlapGrader::new(min_overlap, length_override);
    let grade = grader.evaluate(question, content);
    format_grade(
        grade,
        TermOverlapGrader::overlap(question, content),
        content.chars().count(),
        format,
    )
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(Path::to_path_buf)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ))
            } else {
                let mut output = format!(
                    "Wrote {} prompt template(s) to: {}\n",
                    written.len(),
                    target_dir.display()
                );
                for path in &written {
                    output.push_str("  ");
                    output.push_str(path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown"));
                    output.push('\n');
                }
                output.push_str("\nEdit these files to customize the rewrite, answer and grading prompts.\n");
                output.push_str("Add decide.md to give the decision step a system prompt.\n");
                Ok(output)
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Checkpoint, Conversation};
    use tempfile::TempDir;

    fn cli(db_path: &Path, format: &str, command: Commands) -> Cli {
        Cli {
            db_path: Some(db_path.to_path_buf()),
            verbose: false,
            format: format.to_string(),
            command,
        }
    }

    #[test]
    fn test_grade_command() {
        let out = cmd_grade(
            "What is reward hacking?",
            "reward hacking? yes",
            2,
            100,
            OutputFormat::Text,
        );
        assert!(out.starts_with("answer"));

        let out = cmd_grade("cats", "dogs", 2, 100, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap_or_default();
        assert_eq!(value["grade"], "rewrite");
        assert_eq!(value["overlap"], 0);
    }

    #[test]
    fn test_checkpoint_show_and_delete() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let db = dir.path().join("cp.db");
        let checkpoint = Checkpoint::new(
            Conversation::new("What is reward hacking?"),
            Node::Rewrite,
            0,
            vec![Node::Decide, Node::Retrieve],
        );
        SqliteCheckpointStore::open(&db)
            .and_then(|s| s.save(&checkpoint))
            .unwrap_or_else(|_| unreachable!());

        let show = execute(&cli(
            &db,
            "text",
            Commands::Checkpoint(CheckpointCommands::Show {
                id: checkpoint.id.clone(),
            }),
        ))
        .unwrap_or_default();
        assert!(show.contains("What is reward hacking?"));
        assert!(show.contains("Pending: rewrite"));

        let deleted = execute(&cli(
            &db,
            "text",
            Commands::Checkpoint(CheckpointCommands::Delete {
                id: checkpoint.id.clone(),
            }),
        ));
        assert!(deleted.is_ok());

        let again = execute(&cli(
            &db,
            "text",
            Commands::Checkpoint(CheckpointCommands::Delete { id: checkpoint.id }),
        ));
        assert!(matches!(
            again,
            Err(Error::Storage(StorageError::CheckpointNotFound { .. }))
        ));
    }

    #[test]
    fn test_resume_unknown_checkpoint() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let result = execute(&cli(
            &dir.path().join("cp.db"),
            "text",
            Commands::Resume {
                id: "missing".to_string(),
                replacement: "better question".to_string(),
                run: RunArgs::default(),
            },
        ));
        assert!(matches!(
            result,
            Err(Error::Storage(StorageError::CheckpointNotFound { .. }))
        ));
    }

    #[test]
    fn test_init_prompts_writes_once() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let first = cmd_init_prompts(Some(dir.path()), OutputFormat::Text).unwrap_or_default();
        assert!(first.contains("Wrote 3 prompt template(s)"));
        let second = cmd_init_prompts(Some(dir.path()), OutputFormat::Text).unwrap_or_default();
        assert!(second.contains("already exist"));
    }

    #[test]
    fn test_invalid_grader_argument() {
        let run = RunArgs {
            grader: Some("vibes".to_string()),
            ..RunArgs::default()
        };
        let result = build_config(&run, None);
        assert!(matches!(
            result,
            Err(Error::Command(CommandError::InvalidArgument(_)))
        ));
    }
}
