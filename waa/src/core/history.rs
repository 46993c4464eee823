//! Append-only conversation history and its projection to model messages.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::types::{ToolArguments, ToolResult};

/// Role tag understood by every model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One role-tagged message handed to [`crate::llm::LanguageModel::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Record of a dispatched tool invocation, successful or rejected.
///
/// `tool_name` is `None` when the model emitted a tool call without a usable
/// name; the result then carries the rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: Option<String>,
    pub arguments: ToolArguments,
    pub result: ToolResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    SystemPrompt { prompt: String },
    UserInstruction { instruction: String },
    LlmResponse { turn: u32, response: String },
    ToolCallResult(ToolCallRecord),
}

impl HistoryEntry {
    pub fn role(&self) -> Role {
        match self {
            HistoryEntry::SystemPrompt { .. } => Role::System,
            HistoryEntry::UserInstruction { .. } => Role::User,
            HistoryEntry::LlmResponse { .. } => Role::Assistant,
            HistoryEntry::ToolCallResult(_) => Role::Tool,
        }
    }

    /// Message content for this entry. Tool results render as a JSON object
    /// carrying the tool name, arguments and result.
    pub fn content(&self) -> String {
        match self {
            HistoryEntry::SystemPrompt { prompt } => prompt.clone(),
            HistoryEntry::UserInstruction { instruction } => instruction.clone(),
            HistoryEntry::LlmResponse { response, .. } => response.clone(),
            HistoryEntry::ToolCallResult(record) => json!({
                "tool_name": record.tool_name,
                "arguments": record.arguments,
                "result": record.result,
            })
            .to_string(),
        }
    }

    pub fn to_message(&self) -> Message {
        Message::new(self.role(), self.content())
    }
}

/// Ordered, append-only sequence of [`HistoryEntry`] values.
///
/// Entries cannot be mutated or removed once appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Project every entry, in insertion order, to a backend message.
    pub fn to_messages(&self) -> Vec<Message> {
        self.entries.iter().map(HistoryEntry::to_message).collect()
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCallRecord> {
        self.entries.iter().filter_map(|entry| match entry {
            HistoryEntry::ToolCallResult(record) => Some(record),
            _ => None,
        })
    }

    pub fn llm_responses(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            HistoryEntry::LlmResponse { response, .. } => Some(response.as_str()),
            _ => None,
        })
    }
}
