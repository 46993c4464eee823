//! Tool contract, registry and dispatch.
//!
//! Every capability the model can invoke implements [`Tool`]. Tools are
//! constructed once, initialized exactly once against the
//! [`AgentEnvironment`], then executed any number of times with arguments
//! that already passed schema validation.

pub mod fs;
pub mod node;
pub mod playwright;
pub mod server;
pub mod supertest;
pub mod todo;

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::core::schema::ToolSchema;
use crate::core::types::{ToolArguments, ToolResult};
use crate::env::AgentEnvironment;
use crate::error::InitError;

/// Capability interface implemented by every tool.
pub trait Tool {
    /// Globally unique name, e.g. `fs.read`.
    fn name(&self) -> &str;

    fn schema(&self) -> &ToolSchema;

    /// Static prompt text shown to the model in the tool catalog.
    fn description(&self) -> &str;

    /// Capture whatever the tool needs from the environment. Called once,
    /// before any `execute`.
    fn initialize(&mut self, env: &AgentEnvironment) -> Result<()>;

    /// Run the tool. Expected failures are returned as
    /// [`ToolResult::failure`]; `Err` is reserved for internal errors, which
    /// the registry converts into a failure result.
    fn execute(&self, arguments: &ToolArguments) -> Result<ToolResult>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },
}

pub const MISSING_TOOL_NAME: &str = "Malformed tool call: missing 'tool' name.";

/// Name-indexed set of tools, populated once at startup.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    allowed: Option<HashSet<String>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that silently skips tools whose names are not listed.
    pub fn with_allow_list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tools: Vec::new(),
            allowed: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Register `tool`. Returns `Ok(false)` when the allow-list filtered it
    /// out; a duplicate name is [`InitError::DuplicateTool`].
    pub fn register_tool(&mut self, tool: Box<dyn Tool>) -> Result<bool> {
        let name = tool.name().to_string();
        if let Some(allowed) = &self.allowed
            && !allowed.contains(&name)
        {
            debug!(tool = %name, "tool not in allow-list, skipping");
            return Ok(false);
        }
        if self.tools.iter().any(|t| t.name() == name) {
            return Err(InitError::DuplicateTool { name }.into());
        }
        debug!(tool = %name, "registered tool");
        self.tools.push(tool);
        Ok(true)
    }

    pub fn get_tool(&self, name: &str) -> Result<&dyn Tool, RegistryError> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    /// Registered tools in registration order.
    pub fn list_tools(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(|t| t.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn initialize_all(&mut self, env: &AgentEnvironment) -> Result<()> {
        for tool in &mut self.tools {
            let name = tool.name().to_string();
            tool.initialize(env)
                .with_context(|| format!("initialize tool {name}"))?;
        }
        Ok(())
    }

    /// Resolve, validate and execute one invocation.
    ///
    /// Never fails: every rejection and internal error becomes an `ok=false`
    /// result with a descriptive message.
    #[instrument(skip_all, fields(tool = name.unwrap_or("<missing>")))]
    pub fn invoke(&self, name: Option<&str>, arguments: &ToolArguments) -> ToolResult {
        let Some(name) = name else {
            return ToolResult::failure(MISSING_TOOL_NAME);
        };
        let tool = match self.get_tool(name) {
            Ok(tool) => tool,
            Err(err) => return ToolResult::failure(err.to_string()),
        };
        if let Err(err) = tool.schema().validate(arguments) {
            return ToolResult::failure(format!("Invalid arguments for tool {name}: {err}"));
        }
        match catch_unwind(AssertUnwindSafe(|| tool.execute(arguments))) {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                warn!(error = %format!("{err:#}"), "tool returned an internal error");
                ToolResult::failure(format!("Error executing tool {name}: {err:#}"))
            }
            Err(_) => {
                warn!("tool panicked");
                ToolResult::failure(format!("Error executing tool {name}: tool panicked"))
            }
        }
    }
}

/// The full tool set, in catalog order.
pub fn standard_tools() -> Vec<Box<dyn Tool>> {
    let mut tools = fs::standard_fs_tools();
    tools.extend(todo::standard_todo_tools());
    tools.extend(server::standard_npm_tools());
    tools.extend(supertest::standard_supertest_tools());
    tools.extend(playwright::standard_playwright_tools());
    tools
}

/// Build a registry from [`standard_tools`], filtered by `allowed_tools`.
pub fn build_registry(allowed_tools: Option<&[String]>) -> Result<ToolRegistry> {
    let mut registry = match allowed_tools {
        Some(names) => ToolRegistry::with_allow_list(names.iter().cloned()),
        None => ToolRegistry::new(),
    };
    for tool in standard_tools() {
        registry.register_tool(tool)?;
    }
    if let Some(names) = allowed_tools {
        for name in names {
            if registry.get_tool(name).is_err() {
                warn!(tool = %name, "allowed tool does not exist");
            }
        }
    }
    Ok(registry)
}
