//! OpenAI-compatible remote generator
//!
//! Implements RemoteGenerator against the Chat Completions API. One HTTP
//! request per conversion: transient failures are reported, not retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::prompt::PromptRenderer;
use super::{GenerationRequest, LlmError, RemoteGenerator};
use crate::config::LlmConfig;

/// OpenAI API client
pub struct OpenAiGenerator {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
    prompts: PromptRenderer,
}

impl OpenAiGenerator {
    /// Create a generator from configuration
    ///
    /// Fails when the API key environment variable is unset.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(provider = %config.provider, model = %config.model, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|_| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
            timeout,
            prompts: PromptRenderer::new()?,
        })
    }

    /// Build the request body for the OpenAI API
    fn build_request_body(&self, request: &GenerationRequest) -> Result<serde_json::Value, LlmError> {
        debug!(%self.model, template = %request.template, "build_request_body: called");
        let system_prompt = self.prompts.render(request)?;

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": request.text },
            ],
        });

        // Newer reasoning models reject max_tokens
        let uses_completion_tokens =
            self.model.starts_with("gpt-5") || self.model.starts_with("o1") || self.model.starts_with("o3");
        if uses_completion_tokens {
            body["max_completion_tokens"] = serde_json::json!(self.max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(self.max_tokens);
        }

        Ok(body)
    }

    /// Pull the generated text out of the API response
    fn parse_response(&self, api_response: OpenAIResponse) -> Result<String, LlmError> {
        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| strip_code_fence(&c).to_string())
            .unwrap_or_default();

        if content.is_empty() {
            debug!("parse_response: empty content");
            return Err(LlmError::InvalidResponse("Response contained no text".to_string()));
        }
        Ok(content)
    }
}

/// Remove a surrounding ```` ``` ```` fence some models add around JSON
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line
    match inner.split_once('\n') {
        Some((_, body)) => body.trim(),
        None => inner.trim(),
    }
}

#[async_trait]
impl RemoteGenerator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        debug!(%self.model, template = %request.template, format = %request.format, "generate: called");
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(request)?;

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout)
                } else {
                    LlmError::Network(e)
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            debug!("generate: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !response.status().is_success() {
            debug!(%status, "generate: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        debug!("generate: success");
        let api_response: OpenAIResponse = response.json().await?;
        self.parse_response(api_response)
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}
