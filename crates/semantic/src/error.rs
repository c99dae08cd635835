use thiserror::Error;

/// Errors surfaced by an [`EmbeddingGateway`](crate::EmbeddingGateway).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SemanticError {
    /// Configuration is inconsistent (e.g. api mode without an endpoint).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// The embedding service could not be reached or refused the request.
    ///
    /// Covers transport failures, rate limiting, auth failures and payloads
    /// that are not JSON at all. `retryable` is false for failures a retry
    /// cannot fix (bad credentials, malformed request).
    #[error("embedding service unavailable: {message}")]
    Upstream { message: String, retryable: bool },
    /// The service answered, but the vector is not `dimension` finite numbers.
    #[error("embedding format error: {0}")]
    Format(String),
}

impl SemanticError {
    pub(crate) fn upstream(message: impl Into<String>, retryable: bool) -> Self {
        SemanticError::Upstream {
            message: message.into(),
            retryable,
        }
    }

    /// Whether the orchestrator may retry the call with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SemanticError::Upstream { retryable: true, .. })
    }
}
