//! Command-line behaviour that needs no model.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("agentic-rag").unwrap_or_else(|_| unreachable!());
    cmd.env("RAG_DB_PATH", dir.path().join("checkpoints.db"))
        .env_remove("OPENAI_API_KEY")
        .env_remove("AZURE_OPENAI_API_KEY")
        .env_remove("RAG_API_KEY")
        .env_remove("RAG_CORPUS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("resume"))
        .stdout(predicate::str::contains("checkpoint"));
}

#[test]
fn grade_relevant_content() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    cmd(&dir)
        .args(["grade", "What is reward hacking?", "Reward hacking? It is gaming the reward."])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("answer"));
}

#[test]
fn grade_irrelevant_content_as_json() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    cmd(&dir)
        .args(["--format", "json", "grade", "What is reward hacking?", "Unrelated note."])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""grade": "rewrite""#));
}

#[test]
fn checkpoint_list_on_fresh_database() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    cmd(&dir)
        .args(["checkpoint", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No checkpoints."));
}

#[test]
fn checkpoint_show_unknown_fails() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    cmd(&dir)
        .args(["checkpoint", "show", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("checkpoint not found: missing"));
}

#[test]
fn init_prompts_writes_templates() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    let prompts = dir.path().join("prompts");
    cmd(&dir)
        .arg("init-prompts")
        .arg(&prompts)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 prompt template(s)"));
    assert!(prompts.join("rewrite.md").exists());
    assert!(prompts.join("answer.md").exists());
    assert!(prompts.join("grade.md").exists());
}

#[test]
fn ask_without_api_key_fails() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    let corpus = dir.path().join("corpus.json");
    std::fs::write(&corpus, r#"[{"text": "Reward hacking"}]"#).unwrap_or_else(|_| unreachable!());
    cmd(&dir)
        .args(["ask", "What is reward hacking?", "--corpus"])
        .arg(&corpus)
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key not configured"));
}

#[test]
fn ask_with_missing_corpus_fails() {
    let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
    cmd(&dir)
        .env("OPENAI_API_KEY", "test-key")
        .args(["ask", "What is reward hacking?", "--corpus"])
        .arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load corpus"));
}
