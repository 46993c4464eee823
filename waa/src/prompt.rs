//! System prompt rendering: protocol preamble plus the tool catalog.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::tool::{Tool, ToolRegistry};

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

#[derive(Debug, Clone, Serialize)]
struct ArgumentEntry {
    name: String,
    #[serde(rename = "type")]
    arg_type: String,
    required: bool,
    description: String,
}

#[derive(Debug, Clone, Serialize)]
struct CatalogEntry {
    name: String,
    description: String,
    arguments: Vec<ArgumentEntry>,
}

impl CatalogEntry {
    fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            arguments: tool
                .schema()
                .arguments()
                .iter()
                .map(|arg| ArgumentEntry {
                    name: arg.name.clone(),
                    arg_type: arg.arg_type.to_string(),
                    required: arg.required,
                    description: arg.description.clone(),
                })
                .collect(),
        }
    }
}

struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("system", SYSTEM_TEMPLATE)
            .expect("system template should be valid");
        Self { env }
    }

    fn render_system(&self, tools: &[CatalogEntry]) -> Result<String> {
        let template = self.env.get_template("system")?;
        let rendered = template.render(context! { tools => tools })?;
        Ok(rendered)
    }
}

/// Render the system prompt for every tool in `registry`, in registration
/// order.
pub fn build_system_prompt(registry: &ToolRegistry) -> Result<String> {
    let tools: Vec<CatalogEntry> = registry.list_tools().map(CatalogEntry::from_tool).collect();
    let rendered = PromptEngine::new()
        .render_system(&tools)
        .context("render system prompt")?;
    Ok(rendered.trim_end().to_string())
}
