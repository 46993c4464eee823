//! Shared deterministic types for the agent core.
//!
//! These types define stable contracts between the loop, the tools and the
//! product log. They carry no I/O and serialize identically across runs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Argument mapping handed to a tool (`{"path": "...", ...}`).
pub type ToolArguments = serde_json::Map<String, Value>;

/// Outcome of a single tool call, in the `{ok, data, error}` wire shape.
///
/// Only two shapes are produced: success (`ok = true`, optional `data`) and
/// failure (`ok = false`, `error` set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Convenience accessor for `data[key]`.
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }
}

/// Why a run stopped issuing turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationReason {
    /// The model emitted the termination marker.
    Explicit,
    /// `max_turns` queries were made without a termination marker.
    TurnLimit,
    /// The model backend failed to produce a response.
    EmptyResponse,
}

impl TerminationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationReason::Explicit => "explicit",
            TerminationReason::TurnLimit => "turn-limit",
            TerminationReason::EmptyResponse => "empty-response",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
