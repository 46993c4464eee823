//! Web-App Agent: an LLM-driven, tool-calling agent loop.
//!
//! The agent repeatedly asks a language model what to do next, interprets the
//! reply as a tool call, a termination, or free-form reasoning, and executes
//! the requested tool against a sandboxed working directory. The architecture
//! keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (history, response parsing,
//!   argument schemas). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, the append-only agent log,
//!   process execution).
//! - **[`tool`]** and **[`llm`]**: The two ports the loop drives.
//!
//! [`agent`] wires everything together for the `waa run` command.

pub mod agent;
pub mod core;
pub mod env;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod llm;
pub mod logging;
pub mod prompt;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tool;
