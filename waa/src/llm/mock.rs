//! Deterministic scripted backend.

use std::cell::Cell;

use anyhow::Result;

use super::LanguageModel;
use crate::core::history::Message;

/// Replies used when no script is configured.
pub const DEFAULT_MOCK_RESPONSES: [&str; 4] = [
    r#"<tool_call>{"tool": "fs.read", "arguments": {"path": "package.json"}}</tool_call>"#,
    "Let me check the project structure.",
    r#"<tool_call>{"tool": "tests.run", "arguments": {"type": "all"}}</tool_call>"#,
    "<terminate>",
];

/// Returns scripted responses in order, cycling once exhausted.
#[derive(Debug)]
pub struct MockLanguageModel {
    responses: Vec<String>,
    calls: Cell<usize>,
}

impl MockLanguageModel {
    /// An empty script falls back to [`DEFAULT_MOCK_RESPONSES`].
    pub fn new(responses: Vec<String>) -> Self {
        let responses = if responses.is_empty() {
            DEFAULT_MOCK_RESPONSES.iter().map(|r| r.to_string()).collect()
        } else {
            responses
        };
        Self {
            responses,
            calls: Cell::new(0),
        }
    }

    pub fn from_config(responses: Option<&[String]>) -> Self {
        Self::new(responses.map(<[String]>::to_vec).unwrap_or_default())
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn call_count(&self) -> usize {
        self.calls.get()
    }

    pub fn reset(&self) {
        self.calls.set(0);
    }
}

impl LanguageModel for MockLanguageModel {
    fn generate(&self, _messages: &[Message]) -> Result<String> {
        let idx = self.calls.get();
        self.calls.set(idx + 1);
        Ok(self.responses[idx % self.responses.len()].clone())
    }
}
