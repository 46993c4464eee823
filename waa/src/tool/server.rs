//! Dev-server lifecycle tools (`npm.*`) for the generated Express app.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tracing::info;

use super::Tool;
use super::fs::Sandbox;
use super::node::{PACKAGE_NAME, npm_install, write_package_json};
use crate::core::schema::{ArgType, ToolArgument, ToolSchema};
use crate::core::types::{ToolArguments, ToolResult};
use crate::env::AgentEnvironment;
use crate::io::process::{
    DEFAULT_OUTPUT_LIMIT, OnTimeout, ProcessOutput, command, run_with_policy, run_with_timeout,
};

const DEFAULT_TIMEOUT_SECS: u64 = 5;
const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);
const SERVER_PATTERN: &str = "node.*index.js";
const DEFAULT_LOG_LINES: i64 = 20;

/// The manifest `npm.init` writes: Express + Handlebars, with nodemon
/// running in the background and logging to `.waa/server.log`.
pub fn server_package_json() -> Value {
    json!({
        "name": PACKAGE_NAME,
        "version": "1.0.0",
        "main": "index.js",
        "scripts": {
            "start": "nodemon index.js > .waa/server.log 2>&1 &",
            "start:sync": "nodemon index.js",
            "stop": "pkill -f 'node.*index.js' || true",
            "logs": "tail -n 20 .waa/server.log",
            "logs:follow": "tail -f .waa/server.log",
            "clean": "rm -rf .waa/server.log",
            "dev": "nodemon index.js",
            "status": "pgrep -f 'node.*index.js' && echo 'Server is running' || echo 'Server is not running'"
        },
        "author": "",
        "license": "ISC",
        "dependencies": {
            "express": "^4.18.2",
            "express-handlebars": "^7.1.2"
        },
        "devDependencies": {
            "nodemon": "^3.0.1"
        }
    })
}

/// Last `lines` lines of `contents`.
pub fn tail_lines(contents: &str, lines: usize) -> String {
    let all: Vec<&str> = contents.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NpmOp {
    Init,
    Start,
    Stop,
    Status,
    Logs,
}

struct ServerContext {
    sandbox: Sandbox,
    root: PathBuf,
    server_log: PathBuf,
    timeout: Duration,
}

pub struct NpmTool {
    op: NpmOp,
    schema: ToolSchema,
    ctx: Option<ServerContext>,
}

impl NpmTool {
    fn new(op: NpmOp) -> Self {
        let schema = match op {
            NpmOp::Logs => ToolSchema::new().argument(ToolArgument::optional(
                "lines",
                ArgType::Integer,
                "The number of lines to get, defaults to 20.",
            )),
            _ => ToolSchema::new(),
        };
        Self {
            op,
            schema,
            ctx: None,
        }
    }

    fn init(&self, ctx: &ServerContext) -> Result<ToolResult> {
        let manifest = match ctx.sandbox.writable("package.json") {
            Ok(path) => path,
            Err(refused) => return Ok(refused),
        };
        write_package_json(&manifest, &server_package_json())?;
        let output = npm_install(&ctx.root, INSTALL_TIMEOUT)?;
        if output.timed_out {
            return Ok(ToolResult::failure(format!(
                "npm install timed out after {} seconds",
                INSTALL_TIMEOUT.as_secs()
            )));
        }
        Ok(ToolResult::success(json!({
            "stdout": output.stdout,
            "stderr": output.stderr,
            "return_code": output.exit_code,
            "message": "Server initialized",
        })))
    }

    fn start(&self, ctx: &ServerContext) -> Result<ToolResult> {
        let pids = server_pids(&ctx.root, ctx.timeout)?;
        if !pids.is_empty() {
            return Ok(ToolResult::failure(format!(
                "Server is already running with PIDs: {}",
                pids.join(", ")
            )));
        }
        // Left running at the timeout: a foreground start script is the server.
        let output = run_with_policy(
            command("npm", &["run", "start"], &ctx.root),
            ctx.timeout,
            DEFAULT_OUTPUT_LIMIT,
            OnTimeout::Detach,
        )?;
        if output.timed_out {
            info!("npm start still running at timeout, treating as backgrounded");
            return Ok(ToolResult::success(json!({
                "stdout": "",
                "stderr": "",
                "return_code": Value::Null,
                "message": "Server started in background (timeout expected)",
            })));
        }
        Ok(command_result(&output, "Server start command executed"))
    }

    fn stop(&self, ctx: &ServerContext) -> Result<ToolResult> {
        let output = npm(&ctx.root, &["run", "stop"], ctx.timeout)?;
        Ok(command_result(&output, "Server stop command executed"))
    }

    fn status(&self, ctx: &ServerContext) -> Result<ToolResult> {
        let pids = server_pids(&ctx.root, ctx.timeout)?;
        let running = !pids.is_empty();
        Ok(ToolResult::success(json!({
            "running": running,
            "pids": pids,
            "message": if running { "Server is running" } else { "Server is not running" },
        })))
    }

    fn logs(&self, ctx: &ServerContext, args: &ToolArguments) -> Result<ToolResult> {
        let lines = args
            .get("lines")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_LOG_LINES);
        let Ok(lines) = usize::try_from(lines) else {
            return Ok(ToolResult::failure("lines must be a non-negative integer"));
        };
        if !ctx.server_log.exists() {
            return Ok(ToolResult::failure(
                "Server log not found: .waa/server.log (start the server with npm.start)",
            ));
        }
        let contents = fs::read_to_string(&ctx.server_log)
            .with_context(|| format!("read {}", ctx.server_log.display()))?;
        Ok(ToolResult::success(json!({
            "logs": tail_lines(&contents, lines),
            "message": format!("Retrieved last {lines} lines of server logs"),
        })))
    }
}

fn npm(root: &Path, args: &[&str], timeout: Duration) -> Result<ProcessOutput> {
    run_with_timeout(command("npm", args, root), timeout, DEFAULT_OUTPUT_LIMIT)
}

fn server_pids(root: &Path, timeout: Duration) -> Result<Vec<String>> {
    let output = run_with_timeout(
        command("pgrep", &["-f", SERVER_PATTERN], root),
        timeout,
        DEFAULT_OUTPUT_LIMIT,
    )?;
    if output.exit_code != Some(0) {
        return Ok(Vec::new());
    }
    Ok(output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn command_result(output: &ProcessOutput, message: &str) -> ToolResult {
    ToolResult::success(json!({
        "stdout": output.stdout,
        "stderr": output.stderr,
        "return_code": output.exit_code,
        "message": message,
    }))
}

impl Tool for NpmTool {
    fn name(&self) -> &str {
        match self.op {
            NpmOp::Init => "npm.init",
            NpmOp::Start => "npm.start",
            NpmOp::Stop => "npm.stop",
            NpmOp::Status => "npm.status",
            NpmOp::Logs => "npm.logs",
        }
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn description(&self) -> &str {
        match self.op {
            NpmOp::Init => {
                "Initialize the node.js express server: writes package.json (express, express-handlebars, nodemon) and runs npm install."
            }
            NpmOp::Start => {
                "Start the node.js express server in the background. The dev server runs nodemon, which restarts it when code changes or it crashes. Use npm.status to check it, npm.logs to read its output and npm.stop when done."
            }
            NpmOp::Stop => {
                "Stop the running node.js express server by killing all node processes running index.js. Succeeds silently if no server is running."
            }
            NpmOp::Status => {
                "Check whether the node.js express server is running. Returns the process IDs if it is."
            }
            NpmOp::Logs => {
                "Get the last lines of the server logs from .waa/server.log. Use the `lines` argument to choose how many, default 20."
            }
        }
    }

    fn initialize(&mut self, env: &AgentEnvironment) -> Result<()> {
        let sandbox = Sandbox::from_env(env)?;
        self.ctx = Some(ServerContext {
            root: sandbox.root().to_path_buf(),
            sandbox,
            server_log: env.paths().server_log_path.clone(),
            timeout: env.config_secs("server.timeout", DEFAULT_TIMEOUT_SECS),
        });
        Ok(())
    }

    fn execute(&self, args: &ToolArguments) -> Result<ToolResult> {
        let ctx = self
            .ctx
            .as_ref()
            .ok_or_else(|| anyhow!("{} used before initialize", self.name()))?;
        match self.op {
            NpmOp::Init => self.init(ctx),
            NpmOp::Start => self.start(ctx),
            NpmOp::Stop => self.stop(ctx),
            NpmOp::Status => self.status(ctx),
            NpmOp::Logs => self.logs(ctx, args),
        }
    }
}

pub fn standard_npm_tools() -> Vec<Box<dyn Tool>> {
    [
        NpmOp::Init,
        NpmOp::Start,
        NpmOp::Stop,
        NpmOp::Status,
        NpmOp::Logs,
    ]
    .into_iter()
    .map(|op| Box::new(NpmTool::new(op)) as Box<dyn Tool>)
    .collect()
}
