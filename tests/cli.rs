use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_cli_help() {
    let mut cmd = cargo_bin_cmd!("context-seeker");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("signatures"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("init-prompts"));
}

#[test]
fn test_signatures_text() {
    let prompts = TempDir::new().unwrap_or_else(|_| unreachable!());
    let mut cmd = cargo_bin_cmd!("context-seeker");
    cmd.arg("--prompt-dir")
        .arg(prompts.path())
        .args(["signatures", "question -> answer: float"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base:     question -> answer: float"))
        .stdout(predicate::str::contains(
            "stopping: question, context: list[tuple[str, str]] -> ready: bool",
        ))
        .stdout(predicate::str::contains("-> follow_up_question"))
        .stdout(predicate::str::contains(
            "oracle:   question, privileged_context -> answer",
        ));
}

#[test]
fn test_signatures_json() {
    let prompts = TempDir::new().unwrap_or_else(|_| unreachable!());
    let output = cargo_bin_cmd!("context-seeker")
        .arg("--prompt-dir")
        .arg(prompts.path())
        .args(["--format", "json", "signatures", "question, unit -> answer"])
        .output()
        .unwrap_or_else(|_| unreachable!());
    assert!(output.status.success());

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).unwrap_or_else(|_| unreachable!());
    let roles: Vec<&str> = value["agents"]
        .as_array()
        .map(|agents| agents.iter().filter_map(|a| a["role"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(roles, ["stopping", "query", "answer", "oracle"]);
    assert_eq!(
        value["agents"][2]["signature"],
        "question, unit, context: list[tuple[str, str]] -> answer"
    );
}

#[test]
fn test_signatures_uses_instruction_overrides() {
    let prompts = TempDir::new().unwrap_or_else(|_| unreachable!());
    std::fs::write(prompts.path().join("query.md"), "Ask about units first.\n")
        .unwrap_or_else(|_| unreachable!());

    let mut cmd = cargo_bin_cmd!("context-seeker");
    cmd.arg("--prompt-dir")
        .arg(prompts.path())
        .args(["signatures", "question -> answer"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ask about units first."));
}

#[test]
fn test_signatures_rejects_reserved_field() {
    let prompts = TempDir::new().unwrap_or_else(|_| unreachable!());
    let mut cmd = cargo_bin_cmd!("context-seeker");
    cmd.arg("--prompt-dir")
        .arg(prompts.path())
        .args(["signatures", "question, context -> answer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn test_signatures_rejects_malformed_signature() {
    let mut cmd = cargo_bin_cmd!("context-seeker");
    cmd.args(["signatures", "question answer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing `->`"));
}

#[test]
fn test_init_prompts_writes_files() {
    let temp = TempDir::new().unwrap_or_else(|_| unreachable!());
    let dir = temp.path().join("prompts");

    let mut cmd = cargo_bin_cmd!("context-seeker");
    cmd.arg("init-prompts")
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 4 instruction file(s)"));

    assert!(dir.join("answer.md").exists());
}

#[test]
fn test_ask_without_privileged_context_fails() {
    let mut cmd = cargo_bin_cmd!("context-seeker");
    cmd.env("OPENAI_API_KEY", "test-key")
        .args(["ask", "question -> answer", "-i", "question=why?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--privileged-context"));
}
