use crate::config::AssistantConfig;
use crate::error::{InsightError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Sampling parameters for a single completion call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionParams {
    /// Near-deterministic profile used for SQL generation.
    pub const fn generation() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 1500,
        }
    }

    /// Looser profile used for narrating results.
    pub const fn narration() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// Single-shot text completion. Implementations keep no conversation state.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logging.
    fn name(&self) -> &str;

    async fn invoke(&self, prompt: &str, params: CompletionParams) -> Result<String>;
}

/// OpenAI-compatible chat-completions client (Groq, OpenAI, local gateways).
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self::new(api_key, config.model.clone(), config.base_url.clone()))
    }

    fn request_body(&self, prompt: &str, params: CompletionParams) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        })
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, prompt: &str, params: CompletionParams) -> Result<String> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "calling LLM");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt, params))
            .send()
            .await
            .map_err(|e| InsightError::Llm(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InsightError::Llm(format!("LLM API error ({}): {}", status, error_text)));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| InsightError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        extract_content(&response_json)
    }
}

/// Stand-in used when no API key is configured. Fast-path questions still
/// answer; everything that needs the model fails with the reason.
pub struct UnavailableModel {
    reason: String,
}

impl UnavailableModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl LanguageModel for UnavailableModel {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn invoke(&self, _prompt: &str, _params: CompletionParams) -> Result<String> {
        Err(InsightError::Llm(self.reason.clone()))
    }
}

/// Pull the first choice's message content out of a chat-completions body.
pub(crate) fn extract_content(response_json: &serde_json::Value) -> Result<String> {
    if let Some(error) = response_json.get("error") {
        return Err(InsightError::Llm(format!("LLM API error: {}", error)));
    }

    let choices = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| InsightError::Llm("No choices array in LLM response".to_string()))?;

    let first = choices
        .first()
        .ok_or_else(|| InsightError::Llm("Empty choices array in LLM response".to_string()))?;

    match first.get("finish_reason").and_then(|r| r.as_str()) {
        Some("length") => warn!("LLM response was truncated due to length limit"),
        Some("content_filter") => {
            return Err(InsightError::Llm(
                "LLM response was filtered by content policy".to_string(),
            ))
        }
        _ => {}
    }

    let content = first["message"]["content"]
        .as_str()
        .ok_or_else(|| InsightError::Llm("No content in LLM response".to_string()))?;

    if content.trim().is_empty() {
        return Err(InsightError::Llm("Empty content in LLM response".to_string()));
    }

    Ok(content.to_string())
}
