//! Gemini `generateContent` backend over blocking HTTP.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::LanguageModel;
use crate::core::history::{Message, Role};
use crate::error::InitError;
use crate::io::config::AgentConfig;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: &'a [Content],
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// Map internal messages to Gemini contents.
///
/// System and user become `user`, assistant becomes `model`, tool results
/// become `user` turns prefixed with `Tool result: `. The final entry is the
/// new turn; everything before it is chat history.
pub fn to_gemini_contents(messages: &[Message]) -> Vec<Content> {
    messages
        .iter()
        .map(|message| {
            let (role, text) = match message.role {
                Role::System | Role::User => ("user", message.content.clone()),
                Role::Assistant => ("model", message.content.clone()),
                Role::Tool => ("user", format!("Tool result: {}", message.content)),
            };
            Content {
                role: role.to_string(),
                parts: vec![Part { text }],
            }
        })
        .collect()
}

pub struct GeminiLanguageModel {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiLanguageModel {
    pub fn new(model: &str, api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(InitError::MissingApiKey.into());
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.trim_start_matches("gemini/").to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// `api_key` from config, else `GEMINI_API_KEY`; `model` defaults to
    /// [`DEFAULT_MODEL`].
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None => std::env::var(API_KEY_ENV).unwrap_or_default(),
        };
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        Self::new(model, &api_key)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl LanguageModel for GeminiLanguageModel {
    #[instrument(skip_all, fields(model = %self.model, messages = messages.len()))]
    fn generate(&self, messages: &[Message]) -> Result<String> {
        let contents = to_gemini_contents(messages);
        if contents.is_empty() {
            return Err(anyhow!("Gemini API error: no messages to send"));
        }
        let request = GenerateRequest {
            contents: &contents,
            generation_config: GenerationConfig {
                temperature: 0.0,
                max_output_tokens: 8000,
                top_p: 1.0,
            },
        };

        debug!("sending generateContent request");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .context("Gemini API error: request failed")?;
        let status = response.status();
        let body = response
            .text()
            .context("Gemini API error: read response body")?;
        if !status.is_success() {
            return Err(anyhow!("Gemini API error: {status}: {}", body.trim()));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).context("Gemini API error: decode response")?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(anyhow!("Gemini API error: response contained no text"));
        }
        debug!(len = text.len(), "received response");
        Ok(text)
    }
}
