//! End-to-end runs of the agent loop with the mock backend, plus the `waa`
//! binary's exit codes.

use std::process::Command;

use serde_json::json;
use waa::agent::{Agent, AgentOptions, AgentState};
use waa::core::history::HistoryEntry;
use waa::core::types::TerminationReason;
use waa::exit_codes;
use waa::io::agent_log::read_records;
use waa::test_support::{ScriptedModel, TestWorkspace, mock_config};

fn run(ws: &TestWorkspace) -> Agent {
    let mut agent = Agent::initialize(ws.path(), AgentOptions::default()).expect("initialize");
    agent.run().expect("run");
    agent
}

#[test]
fn history_accounting_matches_turn_kinds() {
    let ws = TestWorkspace::with_config(json!({
        "llm_type": "mock",
        "max_turns": 10,
        "allowed_tools": ["fs.write"],
        "mock_responses": [
            r#"<tool_call>{"tool": "fs.write", "arguments": {"path": "a.txt", "content": "a"}}</tool_call>"#,
            "Thinking about the next step.",
            r#"<tool_call>{"tool": "fs.read", "arguments": {"path": "a.txt"}}</tool_call>"#,
            "<terminate>All done.</terminate>",
        ],
    }));
    let agent = run(&ws);

    // 2 seed entries, 4 responses, 2 tool-invocation turns.
    assert_eq!(agent.history().len(), 2 + 4 + 2);
    let kinds: Vec<&str> = agent
        .history()
        .iter()
        .map(|entry| match entry {
            HistoryEntry::SystemPrompt { .. } => "system",
            HistoryEntry::UserInstruction { .. } => "user",
            HistoryEntry::LlmResponse { .. } => "llm",
            HistoryEntry::ToolCallResult(_) => "tool",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["system", "user", "llm", "tool", "llm", "llm", "tool", "llm"]
    );
    assert_eq!(
        agent.state(),
        AgentState::Terminated(TerminationReason::Explicit)
    );
    assert_eq!(ws.read("a.txt"), "a");
}

#[test]
fn projection_is_deterministic() {
    let ws = TestWorkspace::with_config(mock_config(&["plain", "<terminate>"]));
    let agent = run(&ws);
    assert_eq!(agent.history().to_messages(), agent.history().to_messages());
}

#[test]
fn turn_limit_queries_exactly_max_turns() {
    let ws = TestWorkspace::with_config(json!({"max_turns": 3}));
    let model = ScriptedModel::new(["a", "b", "c", "d", "e"]);
    let options = AgentOptions {
        model: Some(Box::new(model.clone())),
        ..AgentOptions::default()
    };
    let mut agent = Agent::initialize(ws.path(), options).expect("initialize");
    let outcome = agent.run().expect("run");

    assert_eq!(outcome.reason, TerminationReason::TurnLimit);
    assert_eq!(model.calls(), 3);
    assert_eq!(agent.history().llm_responses().count(), 3);
}

#[test]
fn log_records_every_turn() {
    let ws = TestWorkspace::with_config(json!({
        "max_turns": 2,
        "allowed_tools": ["fs.ls"],
        "mock_responses": [r#"<tool_call>{"tool": "fs.ls", "arguments": {"path": "."}}</tool_call>"#],
    }));
    let agent = run(&ws);
    let records = read_records(&ws.log_path()).expect("records");

    let count = |kind: &str| records.iter().filter(|r| r["kind"] == kind).count();
    assert_eq!(count("system_prompt"), 1);
    assert_eq!(count("user_instruction"), 1);
    assert_eq!(count("llm_response"), 2);
    assert_eq!(count("tool_call"), 2);
    assert_eq!(count("tool_result"), 2);
    assert!(records.iter().all(|r| r["ts"].is_string()));
    assert!(
        records
            .iter()
            .any(|r| r["message"] == "--- Turn 2/2 ---")
    );
    assert_eq!(agent.history().tool_calls().count(), 2);
}

#[test]
fn second_run_requires_removing_the_log() {
    let ws = TestWorkspace::with_config(mock_config(&["<terminate>"]));
    run(&ws);
    assert!(Agent::initialize(ws.path(), AgentOptions::default()).is_err());
    std::fs::remove_file(ws.log_path()).expect("remove log");
    run(&ws);
}

fn waa(ws: &TestWorkspace, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_waa"))
        .arg("--working-dir")
        .arg(ws.path())
        .args(args)
        .output()
        .expect("spawn waa")
}

#[test]
fn cli_exit_codes_follow_termination_reason() {
    let ws = TestWorkspace::with_config(mock_config(&["<terminate>Shipped it."]));
    let output = waa(&ws, &["run"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "Shipped it.");

    let ws = TestWorkspace::with_config(json!({"max_turns": 2, "mock_responses": ["hmm"]}));
    assert_eq!(waa(&ws, &["run"]).status.code(), Some(exit_codes::TURN_LIMIT));

    let ws = TestWorkspace::with_config(json!({"llm_type": "unknown"}));
    assert_eq!(waa(&ws, &["run"]).status.code(), Some(exit_codes::INVALID));
}

#[test]
fn cli_init_scaffolds_and_refuses_overwrite() {
    let dir = tempfile::tempdir().expect("tempdir");
    let init = |force: bool| {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_waa"));
        cmd.arg("--working-dir").arg(dir.path()).arg("init");
        if force {
            cmd.arg("--force");
        }
        cmd.status().expect("spawn waa")
    };

    assert_eq!(init(false).code(), Some(exit_codes::OK));
    assert!(dir.path().join(".waa/config.json").is_file());
    assert!(dir.path().join(".waa/instruction.md").is_file());
    assert_eq!(init(false).code(), Some(exit_codes::INVALID));
    assert_eq!(init(true).code(), Some(exit_codes::OK));
}
