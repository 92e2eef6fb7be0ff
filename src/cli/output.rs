//! Output formatting for CLI commands.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::json;

use crate::agent::grader::Grade;
use crate::agent::message::{ChatMessage, Role};
use crate::graph::{Checkpoint, Node, RunOutcome, RunReport, StepEvent};
use crate::storage::CheckpointSummary;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name, defaulting to text for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes a value as pretty JSON with a trailing newline.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        let mut out = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
        out.push('\n');
        out
    }
}

fn trace_line(trace: &[Node]) -> String {
    trace
        .iter()
        .map(Node::as_str)
        .collect::<Vec<_>>()
        .join(" → ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

fn format_message(message: &ChatMessage) -> String {
    match message.role {
        Role::Assistant if message.has_tool_calls() => {
            let calls: Vec<String> = message
                .tool_calls
                .iter()
                .map(|c| format!("{}({})", c.name, c.arguments))
                .collect();
            format!("[assistant] tool call: {}", calls.join(", "))
        }
        Role::Tool if message.content.is_empty() => "[tool] (no content)".to_string(),
        Role::Tool => format!("[tool] {}", truncate(&message.content, 200)),
        role => format!("[{role}] {}", message.content),
    }
}

/// Formats a finished or suspended run.
#[must_use]
pub fn format_outcome(outcome: &RunOutcome, format: OutputFormat) -> String {
    match outcome {
        RunOutcome::Completed(report) => format_report(report, format),
        RunOutcome::Suspended(checkpoint) => format_suspended(checkpoint, format),
    }
}

fn format_report(report: &RunReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = report.answer().to_string();
            let _ = write!(
                out,
                "\n\n---\nTrace: {} | Rewrites: {} | Retrieved: {}\n",
                trace_line(&report.trace),
                report.rewrites,
                if report.retrieved() { "yes" } else { "no" }
            );
            out
        }
        OutputFormat::Json => format.to_json(&json!({
            "status": "completed",
            "answer": report.answer(),
            "trace": report.trace,
            "rewrites": report.rewrites,
            "messages": report.conversation,
        })),
    }
}

fn format_suspended(checkpoint: &Checkpoint, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = format!(
                "Run paused for a human rewrite.\n\nCheckpoint: {}\nQuestion: {}\nRewrites so far: {}\n",
                checkpoint.id,
                checkpoint.question(),
                checkpoint.rewrites
            );
            match checkpoint.rejected_context() {
                Some(context) if !context.is_empty() => {
                    let _ = writeln!(out, "Rejected context: {}", truncate(context, 200));
                }
                _ => out.push_str("Rejected context: (none retrieved)\n"),
            }
            let _ = writeln!(
                out,
                "\nResume with:\n  agentic-rag resume {} \"<better question>\" --corpus <FILE>",
                checkpoint.id
            );
            out
        }
        OutputFormat::Json => format.to_json(&json!({
            "status": "suspended",
            "checkpoint": checkpoint.id,
            "pending": checkpoint.pending,
            "question": checkpoint.question(),
            "rewrites": checkpoint.rewrites,
            "trace": checkpoint.trace,
        })),
    }
}

/// Formats one streamed step. JSON steps are single-line.
#[must_use]
pub fn format_step(step: &StepEvent, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = format!("▶ {}\n", step.node);
            for message in &step.appended {
                let _ = writeln!(out, "  {}", format_message(message));
            }
            out
        }
        OutputFormat::Json => {
            let mut out = serde_json::to_string(step).unwrap_or_else(|_| "{}".to_string());
            out.push('\n');
            out
        }
    }
}

/// Formats the checkpoint listing.
#[must_use]
pub fn format_checkpoint_list(summaries: &[CheckpointSummary], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if summaries.is_empty() {
                return "No checkpoints.\n".to_string();
            }
            let mut out = format!("{:<36}  {:>8}  QUESTION\n", "ID", "REWRITES");
            for s in summaries {
                let _ = writeln!(out, "{:<36}  {:>8}  {}", s.id, s.rewrites, truncate(&s.question, 60));
            }
            out
        }
        OutputFormat::Json => format.to_json(summaries),
    }
}

/// Formats a single checkpoint with its conversation.
#[must_use]
pub fn format_checkpoint(checkpoint: &Checkpoint, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = format!(
                "Checkpoint: {}\nPending: {}\nRewrites: {}\nTrace: {}\n\nConversation:\n",
                checkpoint.id,
                checkpoint.pending,
                checkpoint.rewrites,
                trace_line(&checkpoint.trace)
            );
            for message in checkpoint.conversation.messages() {
                let _ = writeln!(out, "  {}", format_message(message));
            }
            out
        }
        OutputFormat::Json => format.to_json(checkpoint),
    }
}

/// Formats a grading result.
#[must_use]
pub fn format_grade(grade: Grade, overlap: usize, content_chars: usize, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            format!("{grade}\n\n---\nShared terms: {overlap} | Content length: {content_chars}\n")
        }
        OutputFormat::Json => format.to_json(&json!({
            "grade": grade,
            "overlap": overlap,
            "content_chars": content_chars,
        })),
    }
}
