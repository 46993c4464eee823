//! Jest + Supertest API test tools (`supertest.*`).

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Result, anyhow};
use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

use super::Tool;
use super::fs::Sandbox;
use super::node::{check_test_file, merge_package_json, npm_install};
use crate::core::schema::{ArgType, ToolArgument, ToolSchema};
use crate::core::types::{ToolArguments, ToolResult};
use crate::env::AgentEnvironment;
use crate::io::process::{DEFAULT_OUTPUT_LIMIT, command, run_with_timeout};

const DEFAULT_INIT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RUN_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TEST_FILE: &str = "tests/api.test.js";

static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+(passed|failed|total)").expect("count regex should be valid"));

/// Counts scraped from Jest's `Tests:` and `Test Suites:` summary lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JestSummary {
    pub tests: u64,
    pub passed: u64,
    pub failed: u64,
    pub suites: u64,
}

pub fn parse_jest_summary(output: &str) -> JestSummary {
    let mut summary = JestSummary::default();
    for line in output.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("Test Suites:") {
            let counts = counts(rest);
            summary.suites = counts
                .total
                .unwrap_or(counts.passed.unwrap_or(0) + counts.failed.unwrap_or(0));
        } else if let Some(rest) = line.strip_prefix("Tests:") {
            let counts = counts(rest);
            summary.passed = counts.passed.unwrap_or(0);
            summary.failed = counts.failed.unwrap_or(0);
        }
    }
    summary.tests = summary.passed + summary.failed;
    summary
}

#[derive(Default)]
struct Counts {
    passed: Option<u64>,
    failed: Option<u64>,
    total: Option<u64>,
}

fn counts(segment: &str) -> Counts {
    let mut counts = Counts::default();
    for caps in COUNT_RE.captures_iter(segment) {
        let value = caps[1].parse().ok();
        match &caps[2] {
            "passed" => counts.passed = value,
            "failed" => counts.failed = value,
            _ => counts.total = value,
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SupertestOp {
    Init,
    Run,
}

pub struct SupertestTool {
    op: SupertestOp,
    schema: ToolSchema,
    sandbox: Option<Sandbox>,
    timeout: Duration,
}

impl SupertestTool {
    fn new(op: SupertestOp) -> Self {
        let (schema, timeout) = match op {
            SupertestOp::Init => (ToolSchema::new(), DEFAULT_INIT_TIMEOUT_SECS),
            SupertestOp::Run => (
                ToolSchema::new()
                    .argument(ToolArgument::optional(
                        "test_file",
                        ArgType::String,
                        "The test file to run, defaults to 'tests/api.test.js'.",
                    ))
                    .argument(ToolArgument::optional(
                        "verbose",
                        ArgType::Boolean,
                        "Run tests in verbose mode.",
                    )),
                DEFAULT_RUN_TIMEOUT_SECS,
            ),
        };
        Self {
            op,
            schema,
            sandbox: None,
            timeout: Duration::from_secs(timeout),
        }
    }

    fn init(&self, sandbox: &Sandbox) -> Result<ToolResult> {
        let root = sandbox.root();
        let path = match sandbox.writable("package.json") {
            Ok(path) => path,
            Err(refused) => return Ok(refused),
        };
        merge_package_json(
            &path,
            &[("jest", "^29.7.0"), ("supertest", "^6.3.3")],
            &[
                ("test", "jest tests/"),
                ("test:api", "jest tests/api.test.js"),
                ("test:watch", "jest tests/ --watch"),
                ("test:coverage", "jest tests/ --coverage"),
            ],
        )?;
        let output = npm_install(root, self.timeout)?;
        if output.timed_out {
            return Ok(ToolResult::failure(format!(
                "Installation timed out after {} seconds",
                self.timeout.as_secs()
            )));
        }
        if !output.success() {
            return Ok(ToolResult::failure(format!(
                "npm install failed: {}",
                output.stderr.trim()
            )));
        }
        Ok(ToolResult::success(json!({
            "package_updated": path.display().to_string(),
            "install_stdout": output.stdout,
            "message": "Jest and Supertest initialized successfully",
        })))
    }

    fn run(&self, sandbox: &Sandbox, args: &ToolArguments) -> Result<ToolResult> {
        let root = sandbox.root();
        let test_file = args
            .get("test_file")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TEST_FILE);
        if let Some(refused) = check_test_file(sandbox, test_file) {
            return Ok(refused);
        }
        let verbose = args.get("verbose").and_then(Value::as_bool).unwrap_or(false);

        let mut argv = vec!["test", "--", test_file];
        if verbose {
            argv.push("--verbose");
        }
        let output = run_with_timeout(command("npm", &argv, root), self.timeout, DEFAULT_OUTPUT_LIMIT)?;
        if output.timed_out {
            return Ok(ToolResult::failure(format!(
                "Jest tests timed out after {} seconds",
                self.timeout.as_secs()
            )));
        }
        let passed = output.success();
        let summary = parse_jest_summary(&output.combined());
        Ok(ToolResult::success(json!({
            "passed": passed,
            "return_code": output.exit_code,
            "stdout": output.stdout,
            "stderr": output.stderr,
            "summary": summary,
            "test_file": test_file,
            "message": if passed { "API tests passed" } else { "API tests failed" },
        })))
    }
}

impl Tool for SupertestTool {
    fn name(&self) -> &str {
        match self.op {
            SupertestOp::Init => "supertest.init",
            SupertestOp::Run => "supertest.run",
        }
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn description(&self) -> &str {
        match self.op {
            SupertestOp::Init => {
                "Initialize Jest and Supertest for API testing. Adds the dependencies and test scripts to package.json and runs npm install."
            }
            SupertestOp::Run => {
                "Run Jest/Supertest API tests that validate the RESTful endpoints. Optionally choose a test file (defaults to 'tests/api.test.js') and verbose mode. Returns pass/fail status, test counts and the raw output."
            }
        }
    }

    fn initialize(&mut self, env: &AgentEnvironment) -> Result<()> {
        let default = match self.op {
            SupertestOp::Init => DEFAULT_INIT_TIMEOUT_SECS,
            SupertestOp::Run => DEFAULT_RUN_TIMEOUT_SECS,
        };
        self.timeout = env.config_secs("supertest.timeout", default);
        self.sandbox = Some(Sandbox::from_env(env)?);
        Ok(())
    }

    fn execute(&self, args: &ToolArguments) -> Result<ToolResult> {
        let sandbox = self
            .sandbox
            .as_ref()
            .ok_or_else(|| anyhow!("{} used before initialize", self.name()))?;
        match self.op {
            SupertestOp::Init => self.init(sandbox),
            SupertestOp::Run => self.run(sandbox, args),
        }
    }
}

pub fn standard_supertest_tools() -> Vec<Box<dyn Tool>> {
    [SupertestOp::Init, SupertestOp::Run]
        .into_iter()
        .map(|op| Box::new(SupertestTool::new(op)) as Box<dyn Tool>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestWorkspace;

    #[test]
    fn parses_failing_jest_run() {
        let output = "\
FAIL tests/api.test.js
  ✕ GET /posts returns list (12 ms)

Test Suites: 1 failed, 1 total
Tests:       1 failed, 3 passed, 4 total
Snapshots:   0 total
";
        assert_eq!(
            parse_jest_summary(output),
            JestSummary {
                tests: 4,
                passed: 3,
                failed: 1,
                suites: 1,
            }
        );
    }

    #[test]
    fn parses_passing_jest_run() {
        let output = "Test Suites: 2 passed, 2 total\nTests:       7 passed, 7 total\n";
        let summary = parse_jest_summary(output);
        assert_eq!(summary.passed, 7);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.tests, 7);
        assert_eq!(summary.suites, 2);
    }

    fn initialized(ws: &TestWorkspace, op: SupertestOp) -> SupertestTool {
        let mut tool = SupertestTool::new(op);
        tool.initialize(&ws.environment()).expect("initialize");
        tool
    }

    #[test]
    fn init_leaves_a_protected_manifest_alone() {
        let ws = TestWorkspace::with_config(json!({"protected_files": ["package.json"]}));
        ws.write("package.json", r#"{"name":"mine"}"#);
        let result = initialized(&ws, SupertestOp::Init)
            .execute(&ToolArguments::new())
            .expect("execute");
        assert!(!result.ok);
        assert!(result.error.expect("error").contains("protected"));
        assert_eq!(ws.read("package.json"), r#"{"name":"mine"}"#);
    }

    #[test]
    fn run_refuses_option_like_and_escaping_test_files() {
        let ws = TestWorkspace::new();
        let tool = initialized(&ws, SupertestOp::Run);
        for test_file in ["--watchAll", "../elsewhere.test.js"] {
            let args = json!({"test_file": test_file}).as_object().cloned().expect("object");
            let result = tool.execute(&args).expect("execute");
            assert!(!result.ok, "{test_file}");
        }
    }

    #[test]
    fn missing_summary_is_all_zero() {
        assert_eq!(parse_jest_summary("npm ERR! missing script: test"), JestSummary::default());
    }
}
