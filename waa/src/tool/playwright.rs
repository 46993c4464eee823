//! Playwright UI test tools (`playwright.*`).

use std::fs;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
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
const BROWSER_INSTALL_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_TEST_FILE: &str = "tests/ui.test.js";

const PLAYWRIGHT_CONFIG: &str = r"/**
 * Playwright Configuration
 *
 * See https://playwright.dev/docs/test-configuration
 */

const { defineConfig } = require('@playwright/test');

module.exports = defineConfig({
  testDir: './tests',
  testMatch: '**/ui.test.js',
  timeout: 30000,
  retries: 0,
  workers: 1,
  reporter: 'list',
  use: {
    baseURL: 'http://localhost:3000',
    trace: 'on-first-retry',
    screenshot: 'only-on-failure',
    video: 'retain-on-failure',
  },
  projects: [
    {
      name: 'chromium',
      use: { browserName: 'chromium' },
    },
  ],
});
";

static RESULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s+(passed|failed|skipped|flaky)\b")
        .expect("result regex should be valid")
});

/// Counts scraped from Playwright's list-reporter footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlaywrightSummary {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
}

pub fn parse_playwright_summary(output: &str) -> PlaywrightSummary {
    let mut summary = PlaywrightSummary::default();
    for line in output.lines() {
        let Some(caps) = RESULT_RE.captures(line) else {
            continue;
        };
        let Ok(count) = caps[1].parse::<u64>() else {
            continue;
        };
        match &caps[2] {
            "passed" => summary.passed = count,
            "failed" => summary.failed = count,
            "skipped" => summary.skipped = count,
            // Flaky tests eventually passed.
            _ => summary.passed += count,
        }
    }
    summary.total = summary.passed + summary.failed + summary.skipped;
    summary
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaywrightOp {
    Init,
    Run,
}

pub struct PlaywrightTool {
    op: PlaywrightOp,
    schema: ToolSchema,
    sandbox: Option<Sandbox>,
    timeout: Duration,
}

impl PlaywrightTool {
    fn new(op: PlaywrightOp) -> Self {
        let (schema, timeout) = match op {
            PlaywrightOp::Init => (ToolSchema::new(), DEFAULT_INIT_TIMEOUT_SECS),
            PlaywrightOp::Run => (
                ToolSchema::new()
                    .argument(ToolArgument::optional(
                        "test_file",
                        ArgType::String,
                        "The test file to run, defaults to 'tests/ui.test.js'.",
                    ))
                    .argument(ToolArgument::optional(
                        "headed",
                        ArgType::Boolean,
                        "Run the browser in headed (visible) mode.",
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
        let (config_path, package_path) = match (
            sandbox.writable("playwright.config.js"),
            sandbox.writable("package.json"),
        ) {
            (Ok(config), Ok(package)) => (config, package),
            (Err(refused), _) | (_, Err(refused)) => return Ok(refused),
        };
        fs::write(&config_path, PLAYWRIGHT_CONFIG)
            .with_context(|| format!("write {}", config_path.display()))?;
        merge_package_json(
            &package_path,
            &[("@playwright/test", "^1.40.0")],
            &[
                ("test:ui", "playwright test tests/ui.test.js"),
                ("test:ui:headed", "playwright test tests/ui.test.js --headed"),
                ("test:ui:debug", "playwright test tests/ui.test.js --debug"),
            ],
        )?;

        let install = npm_install(root, self.timeout)?;
        if install.timed_out {
            return Ok(ToolResult::failure(format!(
                "Installation timed out after {} seconds",
                self.timeout.as_secs()
            )));
        }
        if !install.success() {
            return Ok(ToolResult::failure(format!(
                "npm install failed: {}",
                install.stderr.trim()
            )));
        }

        let browsers = run_with_timeout(
            command("npx", &["playwright", "install", "chromium"], root),
            BROWSER_INSTALL_TIMEOUT,
            DEFAULT_OUTPUT_LIMIT,
        )?;
        if browsers.timed_out {
            return Ok(ToolResult::failure(format!(
                "Browser installation timed out after {} seconds",
                BROWSER_INSTALL_TIMEOUT.as_secs()
            )));
        }

        Ok(ToolResult::success(json!({
            "config_created": config_path.display().to_string(),
            "package_updated": package_path.display().to_string(),
            "install_stdout": install.stdout,
            "browsers_stdout": browsers.stdout,
            "message": "Playwright initialized successfully",
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
        let headed = args.get("headed").and_then(Value::as_bool).unwrap_or(false);

        let mut argv = vec!["playwright", "test", test_file];
        if headed {
            argv.push("--headed");
        }
        let output = run_with_timeout(command("npx", &argv, root), self.timeout, DEFAULT_OUTPUT_LIMIT)?;
        if output.timed_out {
            return Ok(ToolResult::failure(format!(
                "Playwright tests timed out after {} seconds",
                self.timeout.as_secs()
            )));
        }
        let passed = output.success();
        Ok(ToolResult::success(json!({
            "passed": passed,
            "return_code": output.exit_code,
            "stdout": output.stdout,
            "stderr": output.stderr,
            "summary": parse_playwright_summary(&output.stdout),
            "test_file": test_file,
            "message": if passed { "UI tests passed" } else { "UI tests failed" },
        })))
    }
}

impl Tool for PlaywrightTool {
    fn name(&self) -> &str {
        match self.op {
            PlaywrightOp::Init => "playwright.init",
            PlaywrightOp::Run => "playwright.run",
        }
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn description(&self) -> &str {
        match self.op {
            PlaywrightOp::Init => {
                "Initialize Playwright for UI testing. Creates playwright.config.js, adds @playwright/test and test:ui scripts to package.json, installs dependencies and the chromium browser."
            }
            PlaywrightOp::Run => {
                "Run Playwright UI tests. The server must be running on port 3000 first. Optionally choose a test file (defaults to 'tests/ui.test.js') and headed mode. Returns pass/fail status and test counts."
            }
        }
    }

    fn initialize(&mut self, env: &AgentEnvironment) -> Result<()> {
        let default = match self.op {
            PlaywrightOp::Init => DEFAULT_INIT_TIMEOUT_SECS,
            PlaywrightOp::Run => DEFAULT_RUN_TIMEOUT_SECS,
        };
        self.timeout = env.config_secs("playwright.timeout", default);
        self.sandbox = Some(Sandbox::from_env(env)?);
        Ok(())
    }

    fn execute(&self, args: &ToolArguments) -> Result<ToolResult> {
        let sandbox = self
            .sandbox
            .as_ref()
            .ok_or_else(|| anyhow!("{} used before initialize", self.name()))?;
        match self.op {
            PlaywrightOp::Init => self.init(sandbox),
            PlaywrightOp::Run => self.run(sandbox, args),
        }
    }
}

pub fn standard_playwright_tools() -> Vec<Box<dyn Tool>> {
    [PlaywrightOp::Init, PlaywrightOp::Run]
        .into_iter()
        .map(|op| Box::new(PlaywrightTool::new(op)) as Box<dyn Tool>)
        .collect()
}
