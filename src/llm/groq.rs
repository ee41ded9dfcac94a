// ABOUTME: Groq LLM provider via the OpenAI-compatible chat completions API
// ABOUTME: Llama models on Groq's LPU inference, with typed error mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FusionBite

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmCapabilities, LlmProvider};
use crate::config::LlmConfig;
use crate::errors::{AppError, AppResult};

const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const API_BASE_URL: &str = "https://api.groq.com/openai/v1";

// ---------------------------------------------------------------------------
// Wire types (OpenAI-compatible format)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GroqMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for GroqMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: GroqErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GroqErrorDetail {
    message: String,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Groq LLM provider using LPU-accelerated inference
pub struct GroqProvider {
    client: Client,
    api_key: String,
    model: Option<String>,
}

impl GroqProvider {
    /// Create a provider from configuration
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the API key is empty or the HTTP
    /// client cannot be built.
    pub fn new(config: &LlmConfig) -> AppResult<Self> {
        if config.api_key.is_empty() {
            return Err(AppError::config(
                "missing GROQ_API_KEY. Get a key from https://console.groq.com/keys",
            ));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        if let Ok(error_response) = serde_json::from_str::<GroqErrorResponse>(body) {
            AppError::external_service(
                "Groq",
                format!("HTTP {}: {}", status, error_response.error.message),
            )
        } else {
            AppError::external_service(
                "Groq",
                format!(
                    "HTTP {}: {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            )
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::JSON_MODE | LlmCapabilities::SYSTEM_MESSAGES
    }

    fn default_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let model = request
            .model
            .as_deref()
            .unwrap_or_else(|| self.default_model());

        debug!(model, "sending chat completion request to Groq");

        let groq_request = GroqRequest {
            model: model.to_owned(),
            messages: request.messages.iter().map(GroqMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{API_BASE_URL}/chat/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&groq_request)
            .send()
            .await
            .map_err(|e| {
                error!("failed to send request to Groq API: {e}");
                let mapped = if e.is_timeout() {
                    AppError::timeout("Groq")
                } else {
                    AppError::external_service("Groq", format!("failed to connect: {e}"))
                };
                mapped.with_source(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service("Groq", format!("failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let groq_response: GroqResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::external_service("Groq", format!("unexpected response shape: {e}")).with_source(e)
        })?;

        let choice = groq_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service("Groq", "response contained no choices"))?;

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            model: groq_response.model,
            finish_reason: choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::time::Duration;

    #[test]
    fn test_requires_api_key() {
        let config = LlmConfig {
            api_key: String::new(),
            model: None,
            request_timeout: Duration::from_secs(5),
        };
        assert!(GroqProvider::new(&config).is_err());
    }

    #[test]
    fn test_model_override_wins_over_default() {
        let config = LlmConfig {
            api_key: "key".to_owned(),
            model: Some("llama-3.1-8b-instant".to_owned()),
            request_timeout: Duration::from_secs(5),
        };
        let provider = GroqProvider::new(&config).unwrap();
        assert_eq!(provider.default_model(), "llama-3.1-8b-instant");
    }

    #[test]
    fn test_error_body_parsing() {
        let body = r#"{"error":{"message":"quota exceeded"}}"#;
        let err = GroqProvider::parse_error_response(reqwest::StatusCode::TOO_MANY_REQUESTS, body);
        assert!(err.to_string().contains("quota exceeded"));
    }
}
