//! Language model port and its backends.

pub mod gemini;
pub mod mock;

use anyhow::Result;
use tracing::debug;

use crate::core::history::Message;
use crate::io::config::{AgentConfig, LlmType};

pub use gemini::GeminiLanguageModel;
pub use mock::MockLanguageModel;

/// One operation: turn an ordered message list into response text.
///
/// An `Err` means "no response this turn"; the agent loop ends the run in the
/// empty-response state.
pub trait LanguageModel {
    fn generate(&self, messages: &[Message]) -> Result<String>;
}

impl<T: LanguageModel + ?Sized> LanguageModel for Box<T> {
    fn generate(&self, messages: &[Message]) -> Result<String> {
        (**self).generate(messages)
    }
}

/// Construct the backend selected by `llm_type`.
pub fn build_language_model(config: &AgentConfig) -> Result<Box<dyn LanguageModel>> {
    debug!(llm_type = ?config.llm_type, "building language model");
    match config.llm_type {
        LlmType::Mock => Ok(Box::new(MockLanguageModel::from_config(
            config.mock_responses.as_deref(),
        ))),
        LlmType::Gemini => Ok(Box::new(GeminiLanguageModel::from_config(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::Role;
    use crate::error::InitError;

    #[test]
    fn mock_backend_uses_configured_script() {
        let config = AgentConfig {
            mock_responses: Some(vec!["<terminate>ok".to_string()]),
            ..AgentConfig::default()
        };
        let model = build_language_model(&config).expect("model");
        let reply = model
            .generate(&[Message::new(Role::User, "hi")])
            .expect("reply");
        assert_eq!(reply, "<terminate>ok");
    }

    #[test]
    fn gemini_without_key_is_an_init_error() {
        let config = AgentConfig {
            llm_type: LlmType::Gemini,
            api_key: Some(String::new()),
            ..AgentConfig::default()
        };
        let err = build_language_model(&config).err().expect("should fail");
        assert!(matches!(
            err.downcast_ref::<InitError>(),
            Some(InitError::MissingApiKey)
        ));
    }
}
