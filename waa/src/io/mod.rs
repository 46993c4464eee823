//! I/O helpers: configuration, workspace layout, the agent log and
//! subprocess execution.

pub mod agent_log;
pub mod config;
pub mod init;
pub mod process;
