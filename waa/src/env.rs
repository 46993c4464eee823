//! Read-only run environment: the working directory plus loaded configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::io::config::{AgentConfig, read_config_value};
use crate::io::init::WaaPaths;

/// Immutable view over configuration and the working directory.
///
/// Built once per run and passed by reference to every tool's `initialize`.
#[derive(Debug, Clone)]
pub struct AgentEnvironment {
    working_dir: PathBuf,
    paths: WaaPaths,
    config: AgentConfig,
    raw: Value,
}

impl AgentEnvironment {
    /// Load `.waa/config.json` under `working_dir`.
    pub fn load(working_dir: &Path) -> Result<Self> {
        let paths = WaaPaths::new(working_dir);
        let raw = read_config_value(&paths.config_path)?;
        Self::from_value(working_dir, raw)
            .with_context(|| format!("load {}", paths.config_path.display()))
    }

    /// Build an environment from an in-memory config document.
    pub fn from_value(working_dir: &Path, raw: Value) -> Result<Self> {
        let config = AgentConfig::from_value(&raw)?;
        Ok(Self {
            working_dir: working_dir.to_path_buf(),
            paths: WaaPaths::new(working_dir),
            config,
            raw,
        })
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn paths(&self) -> &WaaPaths {
        &self.paths
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Look up a dotted key such as `server.timeout` in the raw config.
    pub fn config_value(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.raw, |value, segment| value.get(segment))
    }

    /// Integer seconds under `key`, or `default` when absent or not a
    /// non-negative integer.
    pub fn config_secs(&self, key: &str, default: u64) -> Duration {
        let secs = self
            .config_value(key)
            .and_then(Value::as_u64)
            .unwrap_or(default);
        Duration::from_secs(secs)
    }
}
