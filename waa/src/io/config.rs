//! Agent configuration stored under `.waa/config.json`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::InitError;

pub const DEFAULT_MAX_TURNS: u32 = 50;

/// Which language model backend drives the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    #[default]
    Mock,
    Gemini,
}

/// Agent configuration (JSON).
///
/// Missing fields fall back to defaults. Tool-specific sections such as
/// `server` or `supertest` are kept verbatim in `extra` and read through
/// [`crate::env::AgentEnvironment::config_value`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub llm_type: LlmType,

    /// Remote model name; the backend picks its own default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Falls back to `GEMINI_API_KEY` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Scripted replies for the mock backend. Absent or empty selects the
    /// built-in script.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_responses: Option<Vec<String>>,

    pub max_turns: u32,

    /// Tool names to register. `None` registers every standard tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,

    /// Working-dir-relative paths that mutating tools must refuse.
    pub protected_files: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            llm_type: LlmType::Mock,
            model: None,
            api_key: None,
            mock_responses: None,
            max_turns: DEFAULT_MAX_TURNS,
            allowed_tools: None,
            protected_files: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_turns == 0 {
            return Err(anyhow!("max_turns must be > 0"));
        }
        if let Some(allowed) = &self.allowed_tools
            && allowed.iter().any(|name| name.trim().is_empty())
        {
            return Err(anyhow!("allowed_tools must not contain empty names"));
        }
        Ok(())
    }

    /// Build a validated config from an already-parsed JSON document.
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(anyhow!("config must be a JSON object"));
        }
        let cfg: AgentConfig =
            serde_json::from_value(value.clone()).context("decode agent config")?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Read the raw JSON document at `path`.
///
/// A missing file is [`InitError::MissingConfig`].
pub fn read_config_value(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(InitError::MissingConfig {
            path: path.to_path_buf(),
        }
        .into());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

pub fn load_config(path: &Path) -> Result<AgentConfig> {
    let value = read_config_value(path)?;
    AgentConfig::from_value(&value).with_context(|| format!("load {}", path.display()))
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &AgentConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = serde_json::to_string_pretty(cfg).context("serialize config json")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
