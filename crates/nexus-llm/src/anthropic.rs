//! Anthropic (Claude) LLM provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use nexus_core::error::{NexusError, NexusResult};
use nexus_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
use nexus_core::types::{split_system, Message};

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic LLM provider.
pub struct AnthropicLlm {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

impl AnthropicLlm {
    /// Create a new Anthropic LLM provider.
    ///
    /// The key comes from the config, falling back to `ANTHROPIC_API_KEY`.
    pub fn new(config: LlmConfig) -> NexusResult<Self> {
        let api_key: SecretString = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .filter(|k| !k.is_empty())
            .map(SecretString::new)
            .ok_or_else(|| {
                NexusError::Configuration(
                    "Anthropic API key not found. Set ANTHROPIC_API_KEY or provide \
                     anthropic.api_key in config."
                        .to_string(),
                )
            })?;

        let mut key_header = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|_| NexusError::Configuration("Invalid API key format".to_string()))?;
        key_header.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", key_header);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                NexusError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| ANTHROPIC_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut config = config;
        if config.model.is_empty() {
            config.model = LlmConfig::default().model;
        }

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn error_for_status(
        status: reqwest::StatusCode,
        retry_after: Option<u64>,
        body: &str,
    ) -> NexusError {
        let message = serde_json::from_str::<AnthropicError>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status.as_u16() {
            401 | 403 => {
                NexusError::authentication(format!("Anthropic rejected the API key: {}", message))
            }
            429 => {
                NexusError::rate_limit(format!("Anthropic rate limit: {}", message), retry_after)
            }
            // overloaded and server errors are worth retrying
            500..=599 => NexusError::from_http_status(status.as_u16(), &message),
            _ => NexusError::llm(format!("Anthropic API error ({}): {}", status, message)),
        }
    }
}

fn request_error(context: &str, error: reqwest::Error) -> NexusError {
    if error.is_timeout() {
        NexusError::timeout(format!("{}: {}", context, error))
    } else {
        NexusError::api(format!("{}: {}", context, error))
    }
}

#[async_trait]
impl Llm for AnthropicLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> NexusResult<LlmResponse> {
        let options = options.unwrap_or_default();

        let (system, turns) = split_system(messages);
        let conversation: Vec<AnthropicMessage> = turns
            .into_iter()
            .map(|m| AnthropicMessage {
                role: m.role.into(),
                content: &m.content,
            })
            .collect();

        let request = AnthropicRequest {
            model: &self.config.model,
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: options.temperature.or(self.config.temperature),
            system: system.as_deref(),
            messages: conversation,
        };

        debug!(
            model = %self.config.model,
            max_tokens = request.max_tokens,
            messages = request.messages.len(),
            "Sending Anthropic request"
        );

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error("Anthropic API request failed", e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response
            .text()
            .await
            .map_err(|e| request_error("Failed to read response body", e))?;

        if !status.is_success() {
            warn!(status = %status, "Anthropic API returned an error");
            return Err(Self::error_for_status(status, retry_after, &body));
        }

        let response: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| {
                NexusError::llm_invalid_response(format!("Failed to parse response: {}", e))
            })?;

        let content = response
            .content
            .into_iter()
            .find(|c| c.content_type == "text")
            .and_then(|c| c.text);

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        Ok(LlmResponse { content, usage })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
