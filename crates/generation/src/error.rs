use thiserror::Error;

/// Errors from the writer, the captioner and candidate selection.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("invalid generation config: {0}")]
    InvalidConfig(String),
    /// The generation service failed or answered with something unusable.
    #[error("generation service unavailable: {message}")]
    Upstream { message: String, retryable: bool },
    /// `select` was called with an empty candidate list.
    #[error("no candidates to choose from")]
    NoCandidates,
}

impl GenerationError {
    pub(crate) fn upstream(message: impl Into<String>, retryable: bool) -> Self {
        GenerationError::Upstream {
            message: message.into(),
            retryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Upstream { retryable: true, .. })
    }
}
