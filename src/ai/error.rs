use thiserror::Error;

/// Failures talking to the text-completion service.
#[derive(Debug, Error)]
pub enum AIError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Rate limit error: {0}")]
    RateLimit(String),
    #[error("Authentication error: {0}")]
    Authentication(String),
    #[error("API error: unexpected status {status} - Response: {body}")]
    Api { status: u16, body: String },
    #[error("Empty response from model")]
    EmptyResponse,
    #[error("Parse error: {0}")]
    Parse(String),
}

impl AIError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AIError::Network(_) | AIError::RateLimit(_))
    }
}

impl From<reqwest::Error> for AIError {
    fn from(error: reqwest::Error) -> Self {
        AIError::Network(error.to_string())
    }
}
