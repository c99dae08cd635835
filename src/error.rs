//! Error taxonomy for the recommendation pipeline.
//!
//! Every stage crate has its own error enum. [`PipelineError`] wraps them and
//! maps each failure to a stable [`ErrorKind`] plus a [`safe_message`]
//! that never carries upstream payloads, URLs or credentials.
//!
//! | Kind | Typical cause | Retried by the orchestrator |
//! |------|---------------|-----------------------------|
//! | `INVALID_SIGNALS` | no caption, text or mood | no |
//! | `UPSTREAM_UNAVAILABLE` | embedding/writer/captioner outage, rate limit | yes, if transient |
//! | `EMBEDDING_FORMAT` | vector of the wrong shape | once, locally |
//! | `DIMENSION_MISMATCH` | index/model skew | no |
//! | `NO_RECOMMENDATION` | empty index | no |
//! | `CONTRACT_VIOLATION` | malformed writer output, degradation disabled | bounded |
//! | `RESPONSE_WITHHELD` | personal attribute in the final output | bounded |
//! | `STAGE_TIMEOUT` | stage deadline elapsed | yes |
//! | `VALIDATION` | bad ingest submission | no |
//! | `INTERNAL` | configuration or backend misuse | no |
//!
//! [`safe_message`]: PipelineError::safe_message

use contract::{ContractViolation, ViolationKind};
use fusion::FusionError;
use generation::GenerationError;
use index::IndexError;
use ingest::{IngestError, IngestStage};
use semantic::SemanticError;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Pipeline stage bounded by its own deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Caption,
    Embed,
    Search,
    Generate,
    Insert,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Caption => "caption",
            Stage::Embed => "embed",
            Stage::Search => "search",
            Stage::Generate => "generate",
            Stage::Insert => "insert",
        }
    }
}

impl From<IngestStage> for Stage {
    fn from(stage: IngestStage) -> Self {
        match stage {
            IngestStage::Embed => Stage::Embed,
            IngestStage::Insert => Stage::Insert,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-visible error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidSignals,
    UpstreamUnavailable,
    EmbeddingFormat,
    DimensionMismatch,
    NoRecommendation,
    ContractViolation,
    ResponseWithheld,
    StageTimeout,
    Validation,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidSignals => "INVALID_SIGNALS",
            ErrorKind::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            ErrorKind::EmbeddingFormat => "EMBEDDING_FORMAT",
            ErrorKind::DimensionMismatch => "DIMENSION_MISMATCH",
            ErrorKind::NoRecommendation => "NO_RECOMMENDATION",
            ErrorKind::ContractViolation => "CONTRACT_VIOLATION",
            ErrorKind::ResponseWithheld => "RESPONSE_WITHHELD",
            ErrorKind::StageTimeout => "STAGE_TIMEOUT",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while recommending or ingesting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("invalid signals: {0}")]
    InvalidSignals(String),

    #[error(transparent)]
    Embedding(#[from] SemanticError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Writer output kept violating the contract and degradation is disabled.
    #[error("contract violation: {0}")]
    Contract(ContractViolation),

    /// The final output mentions a personal attribute and cannot be returned.
    #[error("response withheld after {violation}")]
    ResponseWithheld { violation: ViolationKind },

    #[error("{stage} stage timed out after {}ms", after.as_millis())]
    StageTimeout { stage: Stage, after: Duration },

    #[error(transparent)]
    Ingest(IngestError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<FusionError> for PipelineError {
    fn from(err: FusionError) -> Self {
        PipelineError::InvalidSignals(err.to_string())
    }
}

/// Ingest deadlines surface as [`PipelineError::StageTimeout`] like any other stage.
impl From<IngestError> for PipelineError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Timeout { stage, after } => PipelineError::StageTimeout {
                stage: stage.into(),
                after,
            },
            other => PipelineError::Ingest(other),
        }
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidSignals(_) => ErrorKind::InvalidSignals,
            PipelineError::Embedding(err) => semantic_kind(err),
            PipelineError::Index(err) => index_kind(err),
            PipelineError::Generation(err) => generation_kind(err),
            PipelineError::Contract(_) => ErrorKind::ContractViolation,
            PipelineError::ResponseWithheld { .. } => ErrorKind::ResponseWithheld,
            PipelineError::StageTimeout { .. } => ErrorKind::StageTimeout,
            PipelineError::Ingest(err) => match err {
                IngestError::Embedding(inner) => semantic_kind(inner),
                IngestError::Index(inner) => index_kind(inner),
                IngestError::Timeout { .. } => ErrorKind::StageTimeout,
                _ => ErrorKind::Validation,
            },
            PipelineError::Config(_) => ErrorKind::Internal,
        }
    }

    /// Whether the orchestrator may retry the failed stage with backoff.
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Embedding(err) => err.is_retryable(),
            PipelineError::Generation(err) => err.is_retryable(),
            PipelineError::StageTimeout { .. } => true,
            _ => false,
        }
    }

    /// Message safe to show a client.
    pub fn safe_message(&self) -> String {
        match self.kind() {
            ErrorKind::InvalidSignals => {
                "provide a photo, a caption, a story or a mood".to_string()
            }
            ErrorKind::UpstreamUnavailable => {
                "an upstream service is unavailable, try again later".to_string()
            }
            ErrorKind::EmbeddingFormat => "the embedding service returned an unusable vector".to_string(),
            ErrorKind::DimensionMismatch => {
                "the index and the embedding model disagree on vector size".to_string()
            }
            ErrorKind::NoRecommendation => "no poem is available to recommend".to_string(),
            ErrorKind::ContractViolation => {
                "the generated recommendation was malformed".to_string()
            }
            ErrorKind::ResponseWithheld => "the recommendation was withheld".to_string(),
            ErrorKind::StageTimeout => match self {
                PipelineError::StageTimeout { stage, .. } => {
                    format!("the {stage} stage took too long")
                }
                _ => "a stage took too long".to_string(),
            },
            ErrorKind::Validation => match self {
                PipelineError::Ingest(err) => match err.field() {
                    Some(field) => format!("field `{field}` is empty or too large"),
                    None => "invalid submission".to_string(),
                },
                _ => "invalid submission".to_string(),
            },
            ErrorKind::Internal => "internal error".to_string(),
        }
    }
}

fn semantic_kind(err: &SemanticError) -> ErrorKind {
    match err {
        SemanticError::Upstream { .. } => ErrorKind::UpstreamUnavailable,
        SemanticError::Format(_) => ErrorKind::EmbeddingFormat,
        SemanticError::InvalidConfig(_) => ErrorKind::Internal,
    }
}

fn index_kind(err: &IndexError) -> ErrorKind {
    match err {
        IndexError::EmptyIndex => ErrorKind::NoRecommendation,
        IndexError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
        IndexError::Backend(_) => ErrorKind::UpstreamUnavailable,
        IndexError::InvalidQuery(_) | IndexError::InvalidConfig(_) => ErrorKind::Internal,
    }
}

fn generation_kind(err: &GenerationError) -> ErrorKind {
    match err {
        GenerationError::Upstream { .. } => ErrorKind::UpstreamUnavailable,
        GenerationError::NoCandidates => ErrorKind::NoRecommendation,
        GenerationError::InvalidConfig(_) => ErrorKind::Internal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_wrapped_error() {
        let upstream = PipelineError::from(SemanticError::Upstream {
            message: "HTTP 503 from https://api.example.com".into(),
            retryable: true,
        });
        assert_eq!(upstream.kind(), ErrorKind::UpstreamUnavailable);
        assert!(upstream.is_retryable());

        assert_eq!(
            PipelineError::from(IndexError::EmptyIndex).kind(),
            ErrorKind::NoRecommendation
        );
        assert_eq!(
            PipelineError::from(FusionError::InvalidSignals).kind(),
            ErrorKind::InvalidSignals
        );
        assert_eq!(
            PipelineError::from(IngestError::EmptyField { field: "title" }).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            PipelineError::from(IngestError::Index(IndexError::DimensionMismatch {
                expected: 3,
                actual: 2
            }))
            .kind(),
            ErrorKind::DimensionMismatch
        );
    }

    #[test]
    fn safe_message_hides_upstream_detail() {
        let err = PipelineError::from(GenerationError::Upstream {
            message: "HTTP 401: invalid key sk-secret at https://api.example.com".into(),
            retryable: false,
        });
        let msg = err.safe_message();
        assert!(!msg.contains("sk-secret"));
        assert!(!msg.contains("https://"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn timeouts_are_retryable_and_named() {
        let err = PipelineError::StageTimeout {
            stage: Stage::Embed,
            after: Duration::from_millis(1500),
        };
        assert!(err.is_retryable());
        assert_eq!(err.kind().as_str(), "STAGE_TIMEOUT");
        assert_eq!(err.to_string(), "embed stage timed out after 1500ms");
        assert_eq!(err.safe_message(), "the embed stage took too long");
    }

    #[test]
    fn ingest_timeout_becomes_stage_timeout() {
        let err = PipelineError::from(IngestError::Timeout {
            stage: IngestStage::Insert,
            after: Duration::from_secs(5),
        });
        assert_eq!(
            err,
            PipelineError::StageTimeout {
                stage: Stage::Insert,
                after: Duration::from_secs(5)
            }
        );
        assert_eq!(err.safe_message(), "the insert stage took too long");
    }

    #[test]
    fn validation_message_names_the_field() {
        let err = PipelineError::from(IngestError::EmptyField { field: "author" });
        assert_eq!(err.safe_message(), "field `author` is empty or too large");
    }

    #[test]
    fn kind_serializes_as_code() {
        let json = serde_json::to_string(&ErrorKind::ResponseWithheld).unwrap();
        assert_eq!(json, "\"RESPONSE_WITHHELD\"");
    }
}
