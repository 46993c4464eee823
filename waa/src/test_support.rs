//! Test-only helpers: temporary workspaces, a scripted model and a stub tool.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Result, anyhow};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::core::history::Message;
use crate::core::schema::{ArgType, ToolArgument, ToolSchema};
use crate::core::types::{ToolArguments, ToolResult};
use crate::env::AgentEnvironment;
use crate::io::init::WaaPaths;
use crate::llm::LanguageModel;
use crate::tool::Tool;

pub const DEFAULT_INSTRUCTION: &str = "Build a tiny blog.";

/// Mock-backend config document with the given script.
pub fn mock_config(responses: &[&str]) -> Value {
    json!({ "llm_type": "mock", "mock_responses": responses })
}

/// Temporary working directory with `.waa/config.json` and `instruction.md`.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self::with_config(json!({ "llm_type": "mock" }))
    }

    pub fn with_config(config: Value) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let ws = Self { dir };
        ws.set_config(&config);
        ws.set_instruction(DEFAULT_INSTRUCTION);
        ws
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> WaaPaths {
        WaaPaths::new(self.path())
    }

    pub fn set_config(&self, config: &Value) {
        let body = serde_json::to_string_pretty(config).expect("serialize config");
        self.write(".waa/config.json", &body);
    }

    pub fn set_instruction(&self, instruction: &str) {
        self.write(".waa/instruction.md", instruction);
    }

    /// Write `contents` to a workspace-relative path, creating parents.
    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path().join(rel)).expect("read file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path().join(rel).exists()
    }

    pub fn log_path(&self) -> PathBuf {
        self.paths().log_path
    }

    pub fn environment(&self) -> AgentEnvironment {
        AgentEnvironment::load(self.path()).expect("load environment")
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Fail(String),
}

#[derive(Debug, Default)]
struct ScriptState {
    replies: VecDeque<ScriptedReply>,
    received: Vec<Vec<Message>>,
}

/// Model that replays a fixed queue and records every message list it
/// receives. Clones share state, so a test can keep a handle after moving
/// one into an agent. An exhausted queue fails like a transport error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::default();
        for reply in replies {
            model.push_text(reply);
        }
        model
    }

    pub fn push_text(&self, reply: impl Into<String>) {
        self.state
            .borrow_mut()
            .replies
            .push_back(ScriptedReply::Text(reply.into()));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.state
            .borrow_mut()
            .replies
            .push_back(ScriptedReply::Fail(message.into()));
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.state.borrow().received.len()
    }

    pub fn received(&self) -> Vec<Vec<Message>> {
        self.state.borrow().received.clone()
    }
}

impl LanguageModel for ScriptedModel {
    fn generate(&self, messages: &[Message]) -> Result<String> {
        let mut state = self.state.borrow_mut();
        state.received.push(messages.to_vec());
        match state.replies.pop_front() {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Fail(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted model exhausted")),
        }
    }
}

#[derive(Debug, Clone)]
enum StubBehavior {
    Succeed,
    Fail(String),
    Panic,
}

/// Tool with a configurable outcome that counts its executions.
pub struct StubTool {
    name: String,
    schema: ToolSchema,
    behavior: StubBehavior,
    executions: Rc<Cell<usize>>,
}

impl StubTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            schema: ToolSchema::new(),
            behavior: StubBehavior::Succeed,
            executions: Rc::new(Cell::new(0)),
        }
    }

    pub fn requiring(mut self, argument: &str) -> Self {
        self.schema = self.schema.argument(ToolArgument::required(
            argument,
            ArgType::String,
            "Required stub argument.",
        ));
        self
    }

    pub fn failing_with(mut self, message: &str) -> Self {
        self.behavior = StubBehavior::Fail(message.to_string());
        self
    }

    pub fn panicking(mut self) -> Self {
        self.behavior = StubBehavior::Panic;
        self
    }

    /// Shared execution counter; stays valid after the tool is boxed.
    pub fn executions(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.executions)
    }
}

impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn description(&self) -> &str {
        "Stub tool for tests."
    }

    fn initialize(&mut self, _env: &AgentEnvironment) -> Result<()> {
        Ok(())
    }

    fn execute(&self, arguments: &ToolArguments) -> Result<ToolResult> {
        self.executions.set(self.executions.get() + 1);
        match &self.behavior {
            StubBehavior::Succeed => Ok(ToolResult::success(json!({ "echo": arguments }))),
            StubBehavior::Fail(message) => Err(anyhow!(message.clone())),
            StubBehavior::Panic => panic!("stub tool panicked"),
        }
    }
}
