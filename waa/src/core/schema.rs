//! Typed argument schemas for tools.
//!
//! A [`ToolSchema`] is an ordered mapping of argument name to [`ToolArgument`].
//! Validation walks the arguments in declaration order and reports the first
//! violation, so the same input always produces the same error.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::core::types::ToolArguments;

/// Expected JSON type of a tool argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    String,
    Integer,
    Boolean,
    List(Box<ArgType>),
}

impl ArgType {
    pub fn list_of(item: ArgType) -> Self {
        ArgType::List(Box::new(item))
    }

    /// Whether `value` conforms to this type. `null` never conforms.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (ArgType::String, Value::String(_)) => true,
            (ArgType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (ArgType::Boolean, Value::Bool(_)) => true,
            (ArgType::List(item), Value::Array(items)) => items.iter().all(|v| item.matches(v)),
            _ => false,
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgType::String => f.write_str("string"),
            ArgType::Integer => f.write_str("integer"),
            ArgType::Boolean => f.write_str("boolean"),
            ArgType::List(item) => write!(f, "list<{item}>"),
        }
    }
}

/// A single named argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub arg_type: ArgType,
}

impl ToolArgument {
    pub fn required(name: &str, arg_type: ArgType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: true,
            arg_type,
        }
    }

    pub fn optional(name: &str, arg_type: ArgType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, arg_type, description)
        }
    }
}

/// Argument validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Argument {name} is required")]
    MissingArgument { name: String },
    #[error("Argument {name} is invalid: expected {expected}, got {found}")]
    InvalidType {
        name: String,
        expected: String,
        found: &'static str,
    },
}

/// Ordered argument mapping owned by a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSchema {
    arguments: Vec<ToolArgument>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument. Re-registering a name replaces the earlier definition
    /// in place, keeping names unique.
    pub fn argument(mut self, argument: ToolArgument) -> Self {
        self.register_argument(argument);
        self
    }

    pub fn register_argument(&mut self, argument: ToolArgument) {
        match self.arguments.iter_mut().find(|a| a.name == argument.name) {
            Some(existing) => *existing = argument,
            None => self.arguments.push(argument),
        }
    }

    pub fn arguments(&self) -> &[ToolArgument] {
        &self.arguments
    }

    pub fn get(&self, name: &str) -> Option<&ToolArgument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Check required presence and type conformance. Unknown keys are ignored.
    pub fn validate(&self, input: &ToolArguments) -> Result<(), SchemaError> {
        for argument in &self.arguments {
            match input.get(&argument.name) {
                None if argument.required => {
                    return Err(SchemaError::MissingArgument {
                        name: argument.name.clone(),
                    });
                }
                None => {}
                Some(value) if !argument.arg_type.matches(value) => {
                    return Err(SchemaError::InvalidType {
                        name: argument.name.clone(),
                        expected: argument.arg_type.to_string(),
                        found: json_type_name(value),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
