//! Text-generation backends.
//!
//! Providers only see the [`TextGenerator`] trait: one prompt in, one block of
//! text out. Which model answers is a configuration detail.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use corpscope_models::config::{LlmBackend, LlmConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::claude_cli::{ClaudeCliConfig, ClaudeCliGenerator};
use crate::error::SourceError;

/// A black-box text-generation call. Mockable for testing.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, SourceError>;
}

/// Build the configured backend.
pub fn build_generator(
    config: &LlmConfig,
    http_timeout: Duration,
) -> Result<Arc<dyn TextGenerator>, SourceError> {
    let generator: Arc<dyn TextGenerator> = match config.backend {
        LlmBackend::Openai => Arc::new(OpenAiGenerator::new(
            OpenAiSettings::from_config(config),
            http_timeout,
        )?),
        LlmBackend::ClaudeCli => Arc::new(ClaudeCliGenerator::new(ClaudeCliConfig {
            model: config.model.clone(),
            timeout: Duration::from_secs(config.cli_timeout_secs),
        })),
    };
    Ok(generator)
}

/// Settings for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
}

impl OpenAiSettings {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

/// Chat completions over HTTP.
pub struct OpenAiGenerator {
    client: Client,
    settings: OpenAiSettings,
}

impl OpenAiGenerator {
    pub fn new(settings: OpenAiSettings, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip_all, fields(model = %self.settings.model))]
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, SourceError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingCredential("OPENAI_API_KEY"))?;

        let request = ChatRequest {
            model: &self.settings.model,
            temperature: self.settings.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        debug!(api_base = %self.settings.api_base, "Sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.settings.api_base))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                source_name: "openai",
                status,
                body,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("chat completion body: {e}")))?;
        first_choice_text(body)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn first_choice_text(response: ChatResponse) -> Result<String, SourceError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| SourceError::Parse("No choices in chat completion".to_string()))?;

    if text.trim().is_empty() {
        return Err(SourceError::Parse("Model returned empty text".to_string()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key: Option<&str>) -> OpenAiSettings {
        OpenAiSettings {
            // Unroutable: a request reaching the network would fail differently.
            api_base: "http://127.0.0.1:9".to_string(),
            api_key: api_key.map(str::to_string),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let generator = OpenAiGenerator::new(settings(None), Duration::from_secs(1)).unwrap();
        let err = generator.complete("sys", "user").await.unwrap_err();
        assert!(matches!(err, SourceError::MissingCredential("OPENAI_API_KEY")));
    }

    #[test]
    fn settings_trim_trailing_slash() {
        let config = LlmConfig {
            api_base: "http://localhost:8000/v1/".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(
            OpenAiSettings::from_config(&config).api_base,
            "http://localhost:8000/v1"
        );
    }

    #[test]
    fn request_body_shape() {
        let request = ChatRequest {
            model: "gpt-4o",
            temperature: 0.0,
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn parse_first_choice() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"PETR4.SA"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice_text(body).unwrap(), "PETR4.SA");
    }

    #[test]
    fn empty_choices_is_parse_error() {
        let body: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_choice_text(body), Err(SourceError::Parse(_))));

        let blank: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap();
        assert!(first_choice_text(blank).is_err());
    }

    #[test]
    fn build_claude_backend() {
        let config = LlmConfig {
            backend: LlmBackend::ClaudeCli,
            ..LlmConfig::default()
        };
        let generator = build_generator(&config, Duration::from_secs(10)).unwrap();
        assert_eq!(generator.name(), "claude_cli");
    }
}
