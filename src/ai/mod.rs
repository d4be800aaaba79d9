use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

mod error;
pub mod prompt;
pub mod response;
pub mod schema;

pub use error::AIError;
pub use prompt::{build_prompt, SYSTEM_INSTRUCTION};
pub use response::{extract, ExtractionError};
pub use schema::{EnvironmentVariable, FileEntry, ProjectDescriptor, SetupInfo, TreeNode};

use crate::config::AIConfig;
use crate::error::GenerateError;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

const INITIAL_RETRY_DELAY: u64 = 1000; // milliseconds
const MAX_RETRY_DELAY: u64 = 10000; // 10 seconds max delay

/// One prompt plus the sampling settings to run it with.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub system_instruction: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
}

impl CompletionRequest {
    pub fn new(prompt: String, config: &AIConfig) -> Self {
        Self {
            model: config.model.clone(),
            prompt,
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
        }
    }
}

/// A service that turns a prompt into free-form text.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError>;
}

#[derive(Debug, Clone)]
struct RetryConfig {
    max_attempts: u32,
    initial_delay: u64,
    max_delay: u64,
}

impl RetryConfig {
    fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: INITIAL_RETRY_DELAY,
            max_delay: MAX_RETRY_DELAY,
        }
    }

    fn get_delay(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay.saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(delay.min(self.max_delay))
    }
}

async fn with_retries<T, F, Fut>(config: &RetryConfig, f: F) -> Result<T, AIError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, AIError>>,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt + 1 < config.max_attempts => {
                let delay = config.get_delay(attempt);
                warn!("Request failed: {}. Retrying in {:?}...", e, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Google Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    retry: RetryConfig,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    /// Fails with [`GenerateError::Config`] when no API key is configured.
    pub fn new(config: &AIConfig) -> Result<Self, GenerateError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                GenerateError::Config("GEMINI_API_KEY environment variable is not set".to_string())
            })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            retry: RetryConfig::new(config.max_attempts),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate_content(&self, request: &CompletionRequest) -> Result<String, AIError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| AIError::Authentication(format!("Invalid API key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .headers(headers)
            .json(&json!({
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": request.prompt }]
                }],
                "systemInstruction": {
                    "parts": [{ "text": request.system_instruction }]
                },
                "generationConfig": {
                    "temperature": request.temperature,
                    "topK": request.top_k,
                    "topP": request.top_p
                }
            }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => (),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AIError::RateLimit("Rate limit exceeded".to_string()));
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AIError::Authentication("Invalid API key".to_string()));
            }
            status => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Could not read error response".to_string());
                return Err(AIError::Api {
                    status: status.as_u16(),
                    body,
                });
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| AIError::Network(format!("Failed to read response body: {}", e)))?;

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| AIError::Parse(format!("Failed to parse Gemini response: {}", e)))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AIError::EmptyResponse);
        }

        debug!(chars = text.len(), "received model response");
        Ok(text)
    }
}

#[async_trait]
impl TextCompletion for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError> {
        with_retries(&self.retry, || self.generate_content(request)).await
    }
}
