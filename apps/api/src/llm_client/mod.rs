/// LLM Client: the single point of entry for all Claude API calls in JobsAI.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Stages depend on the `TextGenerator` trait, never on `LlmClient` itself.
///
/// No retries happen here. A failed call surfaces as `ProviderError` and the
/// calling stage decides whether it has a fallback.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls in JobsAI.
pub const MODEL: &str = "claude-sonnet-4-5";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Transport-level failure of a language-model call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Per-call knobs for `generate_text`.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub system: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerateOptions {
    pub fn with_system(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            ..Self::default()
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            system: prompts::PLAIN_TEXT_SYSTEM.to_string(),
            max_tokens: 800,
            temperature: 0.2,
        }
    }
}

/// The language-model capability consumed by the pipeline.
///
/// Implementations may be shared by concurrent runs, so they must be stateless
/// or internally synchronised.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ProviderError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Anthropic Messages API client. Cheap to clone; shared by all runs.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, api_key })
    }

    /// Makes a single call to the Claude API, returning the full response object.
    pub async fn call(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<LlmResponse, ProviderError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system: &options.system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate_text(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ProviderError> {
        let response = self.call(prompt, options).await?;
        let text = response.text().ok_or(ProviderError::EmptyContent)?;
        debug!("LLM response: {}", text.chars().take(500).collect::<String>());
        Ok(text.to_string())
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
