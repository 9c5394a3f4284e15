//! HTTP client for an OpenAI-compatible chat completions oracle
//!
//! API Specifications:
//! - Endpoint: POST {api_base}/chat/completions
//! - Authentication: Bearer token
//! - Default model: grok-code-fast-1 at https://api.x.ai/v1

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::client::{OracleError, OracleRequest, ReasoningOracle};
use crate::error::ConfigError;
use crate::models::OracleSettings;

const SYSTEM_PROMPT: &str = "You are a cloud security and compliance auditor. \
                             You judge infrastructure configuration against named controls \
                             and answer only with the JSON requested.";

/// Request body for the chat completions API
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Message in conversation (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// "system", "user", or "assistant"
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<UsageMetrics>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: Message,
    /// "stop", or "length" when the token cap cut the answer short
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsageMetrics {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reasoning oracle reached over HTTP
pub struct HttpOracleClient {
    api_key: String,
    /// reused across requests
    http_client: Client,
    api_base: String,
    model: String,
}

impl HttpOracleClient {
    pub fn new(settings: &OracleSettings) -> Result<Self, ConfigError> {
        validate_api_key(&settings.api_key)?;

        Ok(Self {
            api_key: settings.api_key.clone(),
            http_client: Client::new(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn build_request(&self, request: &OracleRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            stream: Some(false),
            temperature: Some(0.0),
            max_tokens: Some(request.max_output_tokens),
        }
    }
}

/// Validate API key format
pub fn validate_api_key(key: &str) -> Result<(), ConfigError> {
    if key.is_empty() {
        return Err(ConfigError::Invalid {
            key: "ORACLE_API_KEY",
            value: String::new(),
            reason: "API key cannot be empty".to_string(),
        });
    }
    if key.len() < 20 {
        return Err(ConfigError::Invalid {
            key: "ORACLE_API_KEY",
            value: "<redacted>".to_string(),
            reason: format!(
                "API key appears invalid (too short). Expected >= 20 characters, got {}",
                key.len()
            ),
        });
    }
    Ok(())
}

/// Pull the answer text out of a chat completions envelope
pub fn extract_content(response_text: &str) -> Result<String, OracleError> {
    let response: ChatResponse = serde_json::from_str(response_text)
        .map_err(|e| OracleError::InvalidResponse(format!("Failed to parse envelope: {}", e)))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| OracleError::InvalidResponse("Response had no choices".to_string()))?;

    if choice.finish_reason.as_deref() == Some("length") {
        warn!(model = %response.model, "Oracle response hit the token limit and may be truncated");
    }
    if let Some(usage) = response.usage {
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "Oracle token usage"
        );
    }

    Ok(choice.message.content)
}

#[async_trait]
impl ReasoningOracle for HttpOracleClient {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        let body = self.build_request(&request);

        let response = self
            .http_client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| OracleError::Network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(OracleError::Http {
                status: status.as_u16(),
                body: response_text,
            });
        }

        extract_content(&response_text)
    }
}
