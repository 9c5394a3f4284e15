use async_trait::async_trait;

/// Prompt sent to the reasoning oracle
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub prompt: String,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("network error: {0}")]
    Network(String),

    #[error("oracle returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("invalid response envelope: {0}")]
    InvalidResponse(String),
}

impl OracleError {
    /// Network failures, rate limiting and server errors may succeed on retry
    pub fn is_transient(&self) -> bool {
        match self {
            OracleError::Network(_) => true,
            OracleError::Http { status, .. } => *status == 429 || *status >= 500,
            OracleError::InvalidResponse(_) => false,
        }
    }
}

/// External reasoning service that judges controls and answers in text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    /// Send one prompt and return the raw response text
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError>;
}
