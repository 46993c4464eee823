//! Canonical `.waa/` paths and workspace scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::info;

use super::config::{AgentConfig, write_config};
use crate::error::InitError;

const INSTRUCTION_PLACEHOLDER: &str = "# Instruction\n\nDescribe the web application the agent should build.\n";

/// All canonical paths within `.waa/` for a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaaPaths {
    pub root: PathBuf,
    pub waa_dir: PathBuf,
    pub config_path: PathBuf,
    pub instruction_path: PathBuf,
    pub log_path: PathBuf,
    pub todo_path: PathBuf,
    pub server_log_path: PathBuf,
}

impl WaaPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let waa_dir = root.join(".waa");
        Self {
            root,
            config_path: waa_dir.join("config.json"),
            instruction_path: waa_dir.join("instruction.md"),
            log_path: waa_dir.join("agent.log"),
            todo_path: waa_dir.join("todo.json"),
            server_log_path: waa_dir.join("server.log"),
            waa_dir,
        }
    }
}

/// Options for `init_workspace`.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// If true, overwrite an existing config and instruction.
    pub force: bool,
}

/// Create `.waa/config.json` (mock defaults) and a placeholder instruction.
///
/// Fails if the config already exists unless `options.force` is set.
pub fn init_workspace(root: &Path, options: &InitOptions) -> Result<WaaPaths> {
    let paths = WaaPaths::new(root);
    if paths.waa_dir.exists() && !paths.waa_dir.is_dir() {
        return Err(anyhow!("waa init: .waa exists but is not a directory"));
    }
    if paths.config_path.exists() && !options.force {
        return Err(anyhow!(
            "waa init: .waa/config.json already exists (use --force to overwrite)"
        ));
    }

    fs::create_dir_all(&paths.waa_dir)
        .with_context(|| format!("create directory {}", paths.waa_dir.display()))?;
    write_config(&paths.config_path, &AgentConfig::default())?;
    if options.force || !paths.instruction_path.exists() {
        fs::write(&paths.instruction_path, INSTRUCTION_PLACEHOLDER)
            .with_context(|| format!("write file {}", paths.instruction_path.display()))?;
    }

    info!(root = %root.display(), force = options.force, "initialized workspace");
    Ok(paths)
}

/// Read the user instruction. A missing file is [`InitError::MissingInstruction`].
pub fn read_instruction(paths: &WaaPaths) -> Result<String> {
    let path = &paths.instruction_path;
    if !path.exists() {
        return Err(InitError::MissingInstruction { path: path.clone() }.into());
    }
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}
