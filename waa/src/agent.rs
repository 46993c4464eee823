//! The agent loop: initialization followed by a bounded sequence of turns.
//!
//! Each turn projects the history to messages, queries the model, records the
//! raw response, then either terminates, dispatches exactly one tool call, or
//! records the response as reasoning. Every milestone is mirrored to the
//! append-only `.waa/agent.log`.

use std::path::Path;

use anyhow::{Result, anyhow};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::core::history::{History, HistoryEntry, ToolCallRecord};
use crate::core::parser::{ParsePrecedence, ParsedResponse, ResponseParser, ToolInvocation};
use crate::core::types::TerminationReason;
use crate::env::AgentEnvironment;
use crate::io::agent_log::AgentLog;
use crate::io::init::read_instruction;
use crate::llm::{LanguageModel, build_language_model};
use crate::prompt::build_system_prompt;
use crate::tool::{ToolRegistry, build_registry};

/// Knobs that are not part of `config.json`.
#[derive(Default)]
pub struct AgentOptions {
    pub debug: bool,
    pub precedence: ParsePrecedence,
    /// Overrides the backend selected by `llm_type`.
    pub model: Option<Box<dyn LanguageModel>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Initialized; no turn has started.
    Ready,
    Running { turn: u32 },
    Terminated(TerminationReason),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub reason: TerminationReason,
    /// Present only for explicit termination.
    pub final_answer: Option<String>,
    /// Turns started, including the one that ended the run.
    pub turns: u32,
}

pub struct Agent {
    env: AgentEnvironment,
    model: Box<dyn LanguageModel>,
    log: AgentLog,
    registry: ToolRegistry,
    history: History,
    parser: ResponseParser,
    max_turns: u32,
    state: AgentState,
}

impl Agent {
    /// Load config, build the model, open the log, register and initialize
    /// tools, then seed the history with the system prompt and instruction.
    ///
    /// Missing config, missing instruction and a pre-existing log are
    /// [`crate::error::InitError`]s.
    #[instrument(skip_all, fields(working_dir = %working_dir.display()))]
    pub fn initialize(working_dir: &Path, options: AgentOptions) -> Result<Self> {
        let env = AgentEnvironment::load(working_dir)?;
        let max_turns = env.config().max_turns;
        let model = match options.model {
            Some(model) => model,
            None => build_language_model(env.config())?,
        };

        let mut log = AgentLog::create(&env.paths().log_path)?;
        log.message("Agent initialization started")?;
        log.message(&format!("Working directory: {}", working_dir.display()))?;
        log.message(&format!("Debug mode: {}", options.debug))?;
        log.message(&format!("Max turns: {max_turns}"))?;

        let mut registry = build_registry(env.config().allowed_tools.as_deref())?;
        for name in registry.names() {
            log.message(&format!("Tool registered: {name}"))?;
        }
        registry.initialize_all(&env)?;
        log.message(&format!(
            "Tool registry initialized with {} tools",
            registry.len()
        ))?;

        let mut history = History::new();
        let prompt = build_system_prompt(&registry)?;
        log.system_prompt(&prompt)?;
        history.append(HistoryEntry::SystemPrompt { prompt });

        let instruction = read_instruction(env.paths())?;
        log.user_instruction(&instruction)?;
        history.append(HistoryEntry::UserInstruction { instruction });

        log.message("Agent initialization complete")?;
        info!(tools = registry.len(), max_turns, "agent initialized");

        Ok(Self {
            env,
            model,
            log,
            registry,
            history,
            parser: ResponseParser::new(options.precedence),
            max_turns,
            state: AgentState::Ready,
        })
    }

    /// Drive turns until termination, turn-limit, or a failed model query.
    ///
    /// A second call is an error; terminal states are reached once.
    pub fn run(&mut self) -> Result<RunOutcome> {
        if self.state != AgentState::Ready {
            return Err(anyhow!("agent run already started ({:?})", self.state));
        }

        let outcome = self.run_turns()?;
        self.state = AgentState::Terminated(outcome.reason);
        self.log.message(&format!(
            "Agent run finished: {} after {} turns",
            outcome.reason, outcome.turns
        ))?;
        info!(reason = %outcome.reason, turns = outcome.turns, "run finished");
        Ok(outcome)
    }

    fn run_turns(&mut self) -> Result<RunOutcome> {
        let max_turns = self.max_turns;
        for turn in 1..=max_turns {
            self.state = AgentState::Running { turn };
            self.log
                .message(&format!("--- Turn {turn}/{max_turns} ---"))?;

            let Some(response) = self.query_model(turn)? else {
                self.log.message("LLM response was empty. Terminating.")?;
                return Ok(RunOutcome {
                    reason: TerminationReason::EmptyResponse,
                    final_answer: None,
                    turns: turn,
                });
            };

            match self.parser.parse(&response) {
                ParsedResponse::Terminate { final_answer } => {
                    self.log.message("Agent decided to terminate.")?;
                    self.log.message(&format!("Final Answer: {final_answer}"))?;
                    return Ok(RunOutcome {
                        reason: TerminationReason::Explicit,
                        final_answer: Some(final_answer),
                        turns: turn,
                    });
                }
                ParsedResponse::ToolCall(invocation) => self.execute_tool(turn, invocation)?,
                ParsedResponse::PlainText => {
                    self.log.message(&format!("Agent thought: {response}"))?;
                }
            }
        }

        self.log.message("Max turns reached. Terminating.")?;
        Ok(RunOutcome {
            reason: TerminationReason::TurnLimit,
            final_answer: None,
            turns: max_turns,
        })
    }

    /// `Ok(None)` when the model failed; the failure is logged, not raised.
    fn query_model(&mut self, turn: u32) -> Result<Option<String>> {
        let messages = self.history.to_messages();
        self.log.message("Querying LLM...")?;
        debug!(turn, messages = messages.len(), "querying model");
        match self.model.generate(&messages) {
            Ok(response) => {
                self.log.llm_response(turn, &response)?;
                self.history.append(HistoryEntry::LlmResponse {
                    turn,
                    response: response.clone(),
                });
                Ok(Some(response))
            }
            Err(err) => {
                self.log.error(&format!("LLM query failed: {err:#}"))?;
                Ok(None)
            }
        }
    }

    fn execute_tool(&mut self, turn: u32, invocation: ToolInvocation) -> Result<()> {
        let ToolInvocation { tool, arguments } = invocation;
        let name = tool.as_deref();
        self.log.tool_call(turn, name, &arguments)?;

        let result = self.registry.invoke(name, &arguments);
        if let Some(error) = result.error.as_deref()
            && !result.ok
        {
            self.log.error(&format!(
                "Tool call failed: tool={} arguments={} error={error}",
                name.unwrap_or("<missing>"),
                Value::Object(arguments.clone()),
            ))?;
        }
        self.log.tool_result(turn, name, &result)?;

        self.history.append(HistoryEntry::ToolCallResult(ToolCallRecord {
            tool_name: tool,
            arguments,
            result,
        }));
        Ok(())
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn environment(&self) -> &AgentEnvironment {
        &self.env
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn log_path(&self) -> &Path {
        self.log.path()
    }
}

/// Initialize an agent in `working_dir` and run it to completion.
pub fn run_agent(working_dir: &Path, options: AgentOptions) -> Result<RunOutcome> {
    let mut agent = Agent::initialize(working_dir, options)?;
    agent.run()
}
