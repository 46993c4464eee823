//! Append-only product log at `.waa/agent.log`.
//!
//! One JSON object per line: `{"ts": <RFC3339 UTC>, "kind": <kind>, ...}`.
//! The sink is always written and is independent of `RUST_LOG`, which only
//! controls the tracing diagnostics mirrored alongside each record.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::core::types::{ToolArguments, ToolResult};
use crate::error::InitError;

pub struct AgentLog {
    path: PathBuf,
    file: File,
}

impl AgentLog {
    /// Create the log file. An existing file is [`InitError::LogExists`].
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let file = match OpenOptions::new().append(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(InitError::LogExists {
                    path: path.to_path_buf(),
                }
                .into());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("create log {}", path.display()));
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Free-form milestone ("Tool registry initialized", turn banners, ...).
    pub fn message(&mut self, message: &str) -> Result<()> {
        info!("{message}");
        self.write("message", json!({ "message": message }))
    }

    pub fn system_prompt(&mut self, prompt: &str) -> Result<()> {
        debug!(len = prompt.len(), "system prompt");
        self.write("system_prompt", json!({ "prompt": prompt }))
    }

    pub fn user_instruction(&mut self, instruction: &str) -> Result<()> {
        debug!(len = instruction.len(), "user instruction");
        self.write("user_instruction", json!({ "instruction": instruction }))
    }

    pub fn llm_response(&mut self, turn: u32, response: &str) -> Result<()> {
        debug!(turn, response, "llm response");
        self.write("llm_response", json!({ "turn": turn, "response": response }))
    }

    pub fn tool_call(
        &mut self,
        turn: u32,
        tool: Option<&str>,
        arguments: &ToolArguments,
    ) -> Result<()> {
        debug!(turn, tool = tool.unwrap_or("<missing>"), ?arguments, "tool call");
        self.write(
            "tool_call",
            json!({ "turn": turn, "tool": tool, "arguments": arguments }),
        )
    }

    pub fn tool_result(&mut self, turn: u32, tool: Option<&str>, result: &ToolResult) -> Result<()> {
        debug!(turn, tool = tool.unwrap_or("<missing>"), ok = result.ok, "tool result");
        self.write(
            "tool_result",
            json!({ "turn": turn, "tool": tool, "result": result }),
        )
    }

    pub fn error(&mut self, message: &str) -> Result<()> {
        warn!("{message}");
        self.write("error", json!({ "error": message }))
    }

    fn write(&mut self, kind: &str, fields: Value) -> Result<()> {
        let mut record = Map::new();
        record.insert(
            "ts".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        record.insert("kind".to_string(), Value::String(kind.to_string()));
        if let Value::Object(fields) = fields {
            record.extend(fields);
        }
        let mut line = serde_json::to_string(&record).context("serialize log record")?;
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .with_context(|| format!("append {}", self.path.display()))?;
        self.file
            .flush()
            .with_context(|| format!("flush {}", self.path.display()))
    }
}

/// Read every record from a log file, in order.
pub fn read_records(path: &Path) -> Result<Vec<Value>> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("parse {} line {}", path.display(), idx + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_json_lines_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".waa").join("agent.log");
        let mut log = AgentLog::create(&path).expect("create");
        log.message("Tool registry initialized").expect("message");
        log.llm_response(1, "hello").expect("response");
        log.tool_result(1, Some("fs.read"), &ToolResult::failure("nope"))
            .expect("result");

        let records = read_records(&path).expect("read");
        let kinds: Vec<&str> = records
            .iter()
            .map(|r| r["kind"].as_str().expect("kind"))
            .collect();
        assert_eq!(kinds, vec!["message", "llm_response", "tool_result"]);
        assert_eq!(records[1]["turn"], 1);
        assert_eq!(records[2]["result"]["error"], "nope");
        assert!(records[0]["ts"].as_str().expect("ts").ends_with('Z'));
    }

    #[test]
    fn existing_log_is_refused() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("agent.log");
        fs::write(&path, "previous run\n").expect("seed");
        let err = AgentLog::create(&path).err().expect("should fail");
        assert!(matches!(
            err.downcast_ref::<InitError>(),
            Some(InitError::LogExists { .. })
        ));
        assert!(err.to_string().contains("Remove it to start a new run"));
        assert_eq!(fs::read_to_string(&path).expect("read"), "previous run\n");
    }
}
