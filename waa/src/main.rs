//! `waa` command-line entry point.
//!
//! `waa init` scaffolds `.waa/` in the working directory; `waa run` drives the
//! agent until it terminates and exits with a code from [`waa::exit_codes`].

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use waa::agent::{AgentOptions, run_agent};
use waa::exit_codes;
use waa::io::init::{InitOptions, init_workspace};
use waa::logging;

#[derive(Parser)]
#[command(
    name = "waa",
    version,
    about = "LLM-driven agent that builds and tests web applications"
)]
struct Cli {
    /// Directory containing `.waa/` and the project the agent works on.
    #[arg(long, global = true, default_value = ".")]
    working_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the agent loop using `.waa/config.json` and `.waa/instruction.md`.
    Run {
        /// Verbose diagnostics on stderr (overridden by `RUST_LOG`).
        #[arg(long)]
        debug: bool,
    },
    /// Create `.waa/config.json` and a placeholder instruction.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(matches!(cli.command, Command::Run { debug: true }));
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Init { force } => {
            let paths = init_workspace(&cli.working_dir, &InitOptions { force })?;
            println!("Initialized {}", paths.waa_dir.display());
            Ok(exit_codes::OK)
        }
        Command::Run { debug } => {
            let options = AgentOptions {
                debug,
                ..AgentOptions::default()
            };
            let outcome = run_agent(&cli.working_dir, options)?;
            if let Some(answer) = outcome.final_answer.as_deref()
                && !answer.is_empty()
            {
                println!("{answer}");
            }
            eprintln!("waa: {} after {} turns", outcome.reason, outcome.turns);
            Ok(exit_codes::for_reason(outcome.reason))
        }
    }
}
