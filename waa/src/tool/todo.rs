//! Todo-list tools (`todo.*`) persisted at `.waa/todo.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::Tool;
use crate::core::schema::{ArgType, ToolArgument, ToolSchema};
use crate::core::types::{ToolArguments, ToolResult};
use crate::env::AgentEnvironment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: i64,
    pub description: String,
    pub status: TodoStatus,
    pub created_at: String,
    pub completed_at: Option<String>,
}

/// Load the todo list; a missing file is an empty list.
pub fn read_todos(path: &Path) -> Result<Vec<TodoItem>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

pub fn write_todos(path: &Path, todos: &[TodoItem]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut buf = serde_json::to_string_pretty(todos).context("serialize todos")?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write {}", path.display()))
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TodoOp {
    Add,
    List,
    Complete,
    Remove,
}

pub struct TodoTool {
    op: TodoOp,
    schema: ToolSchema,
    todo_path: Option<PathBuf>,
}

impl TodoTool {
    fn new(op: TodoOp) -> Self {
        let schema = match op {
            TodoOp::Add => ToolSchema::new().argument(ToolArgument::required(
                "description",
                ArgType::String,
                "The description of the TODO item.",
            )),
            TodoOp::List => ToolSchema::new().argument(ToolArgument::optional(
                "status",
                ArgType::String,
                "Filter by status: 'pending', 'completed', or 'all'. Defaults to 'all'.",
            )),
            TodoOp::Complete => ToolSchema::new().argument(ToolArgument::required(
                "id",
                ArgType::Integer,
                "The ID of the item to mark as completed.",
            )),
            TodoOp::Remove => ToolSchema::new().argument(ToolArgument::required(
                "id",
                ArgType::Integer,
                "The ID of the item to remove.",
            )),
        };
        Self {
            op,
            schema,
            todo_path: None,
        }
    }

    fn add(&self, path: &Path, args: &ToolArguments) -> Result<ToolResult> {
        let description = args
            .get("description")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("missing description argument"))?;
        let mut todos = read_todos(path)?;
        let id = todos.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        todos.push(TodoItem {
            id,
            description: description.to_string(),
            status: TodoStatus::Pending,
            created_at: now(),
            completed_at: None,
        });
        write_todos(path, &todos)?;
        Ok(ToolResult::success(json!({
            "id": id,
            "message": format!("TODO item added with ID: {id}."),
        })))
    }

    fn list(&self, path: &Path, args: &ToolArguments) -> Result<ToolResult> {
        let filter = match args.get("status").and_then(Value::as_str).unwrap_or("all") {
            "all" => None,
            "pending" => Some(TodoStatus::Pending),
            "completed" => Some(TodoStatus::Completed),
            _ => {
                return Ok(ToolResult::failure(
                    "Invalid status filter. Must be one of: pending, completed, all",
                ));
            }
        };
        let todos: Vec<TodoItem> = read_todos(path)?
            .into_iter()
            .filter(|t| filter.is_none_or(|status| t.status == status))
            .collect();
        Ok(ToolResult::success(json!({
            "count": todos.len(),
            "todos": todos,
        })))
    }

    fn complete(&self, path: &Path, id: i64) -> Result<ToolResult> {
        let mut todos = read_todos(path)?;
        let Some(item) = todos.iter_mut().find(|t| t.id == id) else {
            return Ok(not_found(id));
        };
        item.status = TodoStatus::Completed;
        item.completed_at = Some(now());
        write_todos(path, &todos)?;
        Ok(ToolResult::success(json!({
            "message": format!("TODO item {id} marked as completed."),
        })))
    }

    fn remove(&self, path: &Path, id: i64) -> Result<ToolResult> {
        let mut todos = read_todos(path)?;
        let before = todos.len();
        todos.retain(|t| t.id != id);
        if todos.len() == before {
            return Ok(not_found(id));
        }
        write_todos(path, &todos)?;
        Ok(ToolResult::success(json!({
            "message": format!("TODO item {id} removed."),
        })))
    }
}

fn not_found(id: i64) -> ToolResult {
    ToolResult::failure(format!("TODO item with ID {id} not found."))
}

fn id_arg(args: &ToolArguments) -> Result<i64> {
    args.get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow!("missing id argument"))
}

impl Tool for TodoTool {
    fn name(&self) -> &str {
        match self.op {
            TodoOp::Add => "todo.add",
            TodoOp::List => "todo.list",
            TodoOp::Complete => "todo.complete",
            TodoOp::Remove => "todo.remove",
        }
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn description(&self) -> &str {
        match self.op {
            TodoOp::Add => {
                "Add a new TODO item. Generates a unique ID, sets status to 'pending' and records the creation timestamp."
            }
            TodoOp::List => {
                "List TODO items. Supports an optional status filter: 'pending', 'completed', or 'all' (default)."
            }
            TodoOp::Complete => {
                "Mark an item as completed by ID. Updates the status and records the completion timestamp."
            }
            TodoOp::Remove => "Remove a TODO item by ID.",
        }
    }

    fn initialize(&mut self, env: &AgentEnvironment) -> Result<()> {
        self.todo_path = Some(env.paths().todo_path.clone());
        Ok(())
    }

    fn execute(&self, args: &ToolArguments) -> Result<ToolResult> {
        let path = self
            .todo_path
            .as_deref()
            .ok_or_else(|| anyhow!("{} used before initialize", self.name()))?;
        match self.op {
            TodoOp::Add => self.add(path, args),
            TodoOp::List => self.list(path, args),
            TodoOp::Complete => self.complete(path, id_arg(args)?),
            TodoOp::Remove => self.remove(path, id_arg(args)?),
        }
    }
}

pub fn standard_todo_tools() -> Vec<Box<dyn Tool>> {
    [TodoOp::Add, TodoOp::List, TodoOp::Complete, TodoOp::Remove]
        .into_iter()
        .map(|op| Box::new(TodoTool::new(op)) as Box<dyn Tool>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestWorkspace;

    struct Todos {
        ws: TestWorkspace,
        tools: Vec<Box<dyn Tool>>,
    }

    impl Todos {
        fn new() -> Self {
            let ws = TestWorkspace::new();
            let env = ws.environment();
            let mut tools = standard_todo_tools();
            for tool in &mut tools {
                tool.initialize(&env).expect("initialize");
            }
            Self { ws, tools }
        }

        fn run(&self, name: &str, args: Value) -> ToolResult {
            let tool = self
                .tools
                .iter()
                .find(|t| t.name() == name)
                .expect("tool exists");
            let args = args.as_object().cloned().expect("object");
            tool.schema().validate(&args).expect("valid args");
            tool.execute(&args).expect("execute")
        }

        fn stored(&self) -> Vec<TodoItem> {
            read_todos(&self.ws.path().join(".waa/todo.json")).expect("read todos")
        }
    }

    #[test]
    fn add_assigns_increasing_ids() {
        let todos = Todos::new();
        assert!(todos.run("todo.add", json!({"description": "scaffold server"})).ok);
        let second = todos.run("todo.add", json!({"description": "write tests"}));
        assert_eq!(second.data_field("id"), Some(&json!(2)));

        let stored = todos.stored();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].status, TodoStatus::Pending);
        assert!(stored[0].completed_at.is_none());
    }

    #[test]
    fn ids_continue_from_max_after_removal() {
        let todos = Todos::new();
        todos.run("todo.add", json!({"description": "a"}));
        todos.run("todo.add", json!({"description": "b"}));
        assert!(todos.run("todo.remove", json!({"id": 1})).ok);
        let third = todos.run("todo.add", json!({"description": "c"}));
        assert_eq!(third.data_field("id"), Some(&json!(3)));
    }

    #[test]
    fn list_filters_by_status() {
        let todos = Todos::new();
        todos.run("todo.add", json!({"description": "a"}));
        todos.run("todo.add", json!({"description": "b"}));
        assert!(todos.run("todo.complete", json!({"id": 2})).ok);

        let pending = todos.run("todo.list", json!({"status": "pending"}));
        assert_eq!(pending.data_field("count"), Some(&json!(1)));
        let completed = todos.run("todo.list", json!({"status": "completed"}));
        assert_eq!(completed.data_field("todos").expect("todos")[0]["id"], 2);
        assert!(completed.data_field("todos").expect("todos")[0]["completed_at"].is_string());
        let all = todos.run("todo.list", json!({}));
        assert_eq!(all.data_field("count"), Some(&json!(2)));

        let invalid = todos.run("todo.list", json!({"status": "done"}));
        assert!(!invalid.ok);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let todos = Todos::new();
        let result = todos.run("todo.complete", json!({"id": 42}));
        assert_eq!(result.error.as_deref(), Some("TODO item with ID 42 not found."));
        assert!(!todos.run("todo.remove", json!({"id": 42})).ok);
    }

    #[test]
    fn list_on_missing_file_is_empty() {
        let todos = Todos::new();
        let result = todos.run("todo.list", json!({"status": "all"}));
        assert_eq!(result.data_field("count"), Some(&json!(0)));
    }
}
