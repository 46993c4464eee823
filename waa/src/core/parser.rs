//! Classify raw model output into a tool call, a termination, or plain text.
//!
//! Parsing is two-stage: delimiters are detected first, then the tool-call
//! interior is decoded as JSON. A decode failure is a classification outcome
//! (plain text), never an error.

use serde_json::Value;
use tracing::debug;

use crate::core::types::ToolArguments;

pub const TOOL_CALL_OPEN: &str = "<tool_call>";
pub const TOOL_CALL_CLOSE: &str = "</tool_call>";
pub const TERMINATE_OPEN: &str = "<terminate>";
pub const TERMINATE_CLOSE: &str = "</terminate>";

/// Which marker wins when a response carries both a termination marker and a
/// well-formed tool call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParsePrecedence {
    #[default]
    TerminateFirst,
    ToolCallFirst,
}

/// A tool invocation extracted from model text.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// `None` when the payload had a `tool` key that was null, empty or not a string.
    pub tool: Option<String>,
    pub arguments: ToolArguments,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    ToolCall(ToolInvocation),
    Terminate { final_answer: String },
    PlainText,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser {
    precedence: ParsePrecedence,
}

impl ResponseParser {
    pub fn new(precedence: ParsePrecedence) -> Self {
        Self { precedence }
    }

    pub fn precedence(&self) -> ParsePrecedence {
        self.precedence
    }

    pub fn parse(&self, response: &str) -> ParsedResponse {
        let parsed = match self.precedence {
            ParsePrecedence::TerminateFirst => parse_termination(response)
                .or_else(|| parse_tool_call(response).map(ParsedResponse::ToolCall)),
            ParsePrecedence::ToolCallFirst => parse_tool_call(response)
                .map(ParsedResponse::ToolCall)
                .or_else(|| parse_termination(response)),
        };
        parsed.unwrap_or(ParsedResponse::PlainText)
    }
}

fn parse_termination(response: &str) -> Option<ParsedResponse> {
    if !response.contains(TERMINATE_OPEN) {
        return None;
    }
    let final_answer = response
        .replace(TERMINATE_OPEN, "")
        .replace(TERMINATE_CLOSE, "")
        .trim()
        .to_string();
    Some(ParsedResponse::Terminate { final_answer })
}

/// Decode a tool call when the whole trimmed response is wrapped in tool-call
/// delimiters. Only the first block is considered.
pub fn parse_tool_call(response: &str) -> Option<ToolInvocation> {
    let trimmed = response.trim();
    if !trimmed.starts_with(TOOL_CALL_OPEN) || !trimmed.ends_with(TOOL_CALL_CLOSE) {
        return None;
    }
    let body = &trimmed[TOOL_CALL_OPEN.len()..];
    let end = body.find(TOOL_CALL_CLOSE)?;
    let interior = body[..end].trim();

    let payload = match serde_json::from_str::<Value>(interior) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            debug!(kind = ?other, "tool call payload is not an object");
            return None;
        }
        Err(err) => {
            debug!(err = %err, "tool call payload is not valid json");
            return None;
        }
    };

    let tool = match payload.get("tool")? {
        Value::String(name) if !name.trim().is_empty() => Some(name.clone()),
        _ => None,
    };
    let arguments = match payload.get("arguments") {
        None => ToolArguments::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return None,
    };
    Some(ToolInvocation { tool, arguments })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(response: &str) -> ParsedResponse {
        ResponseParser::default().parse(response)
    }

    fn invocation(response: &str) -> ToolInvocation {
        match parse(response) {
            ParsedResponse::ToolCall(call) => call,
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn recognizes_wrapped_tool_call() {
        let call = invocation(
            "  <tool_call>{\"tool\": \"fs.read\", \"arguments\": {\"path\": \"a.txt\"}}</tool_call>\n",
        );
        assert_eq!(call.tool.as_deref(), Some("fs.read"));
        assert_eq!(call.arguments["path"], "a.txt");
    }

    #[test]
    fn missing_arguments_default_to_empty() {
        let call = invocation("<tool_call>{\"tool\": \"npm.status\"}</tool_call>");
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn text_around_the_block_is_plain_text() {
        assert_eq!(
            parse("Sure! <tool_call>{\"tool\": \"fs.read\", \"arguments\": {}}</tool_call>"),
            ParsedResponse::PlainText
        );
    }

    #[test]
    fn malformed_json_is_plain_text() {
        assert_eq!(
            parse("<tool_call>{\"tool\": \"fs.read\", </tool_call>"),
            ParsedResponse::PlainText
        );
        assert_eq!(parse("<tool_call>[1, 2]</tool_call>"), ParsedResponse::PlainText);
    }

    #[test]
    fn payload_without_tool_key_is_plain_text() {
        assert_eq!(
            parse("<tool_call>{\"arguments\": {}}</tool_call>"),
            ParsedResponse::PlainText
        );
    }

    #[test]
    fn non_object_arguments_are_plain_text() {
        assert_eq!(
            parse("<tool_call>{\"tool\": \"fs.read\", \"arguments\": \"a.txt\"}</tool_call>"),
            ParsedResponse::PlainText
        );
    }

    #[test]
    fn empty_or_null_tool_name_is_a_nameless_call() {
        assert_eq!(invocation("<tool_call>{\"tool\": \"\"}</tool_call>").tool, None);
        assert_eq!(invocation("<tool_call>{\"tool\": null}</tool_call>").tool, None);
        assert_eq!(invocation("<tool_call>{\"tool\": 7}</tool_call>").tool, None);
    }

    #[test]
    fn only_first_block_is_taken() {
        let call = invocation(
            "<tool_call>{\"tool\": \"fs.mkdir\", \"arguments\": {\"path\": \"a\"}}</tool_call>\n\
             <tool_call>{\"tool\": \"fs.rmdir\", \"arguments\": {\"path\": \"a\"}}</tool_call>",
        );
        assert_eq!(call.tool.as_deref(), Some("fs.mkdir"));
    }

    #[test]
    fn termination_strips_markers() {
        assert_eq!(
            parse("<terminate>Done."),
            ParsedResponse::Terminate {
                final_answer: "Done.".to_string()
            }
        );
        assert_eq!(
            parse("All set.\n<terminate>\nShipped it.</terminate>  "),
            ParsedResponse::Terminate {
                final_answer: "All set.\n\nShipped it.".to_string()
            }
        );
        assert_eq!(
            parse("<terminate>"),
            ParsedResponse::Terminate {
                final_answer: String::new()
            }
        );
    }

    #[test]
    fn termination_wins_by_default() {
        let response =
            "<tool_call>{\"tool\": \"fs.read\", \"arguments\": {\"note\": \"<terminate>\"}}</tool_call>";
        assert!(matches!(
            parse(response),
            ParsedResponse::Terminate { .. }
        ));
    }

    #[test]
    fn tool_call_first_precedence_prefers_the_call() {
        let parser = ResponseParser::new(ParsePrecedence::ToolCallFirst);
        let response =
            "<tool_call>{\"tool\": \"fs.read\", \"arguments\": {\"note\": \"<terminate>\"}}</tool_call>";
        assert!(matches!(parser.parse(response), ParsedResponse::ToolCall(_)));
        assert!(matches!(
            parser.parse("<terminate>bye"),
            ParsedResponse::Terminate { .. }
        ));
    }

    #[test]
    fn free_text_is_plain_text() {
        assert_eq!(
            parse("Let me check the project structure."),
            ParsedResponse::PlainText
        );
        assert_eq!(parse(""), ParsedResponse::PlainText);
    }
}
