//! Typed errors the agent needs to tell apart.
//!
//! These travel inside `anyhow::Error` and are recovered with `downcast_ref`
//! where a caller needs the category.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised before the first turn.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Configuration file not found: {}", path.display())]
    MissingConfig { path: PathBuf },
    #[error("Instruction file not found: {}", path.display())]
    MissingInstruction { path: PathBuf },
    #[error("Log file already exists: {}. Remove it to start a new run.", path.display())]
    LogExists { path: PathBuf },
    #[error("Gemini API key not configured: set api_key in config.json or GEMINI_API_KEY")]
    MissingApiKey,
    #[error("Tool already registered: {name}")]
    DuplicateTool { name: String },
}
