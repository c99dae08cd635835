//! Error types produced by the ingest crate.
//!
//! | Error | Category | Description |
//! |-------|----------|-------------|
//! | [`EmptyField`](IngestError::EmptyField) | Validation | A field is empty after trimming |
//! | [`FieldTooLarge`](IngestError::FieldTooLarge) | Validation | A field exceeds its byte limit |
//! | [`Embedding`](IngestError::Embedding) | Upstream | The embedding gateway failed |
//! | [`Index`](IngestError::Index) | Storage | The index rejected the record |
//! | [`Timeout`](IngestError::Timeout) | Upstream | Embedding or insert missed its deadline |
//!
//! Validation errors are raised before any external call, so a rejected
//! submission never reaches the embedding service or the index.
use index::IndexError;
use semantic::SemanticError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// External call made by an ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestStage {
    Embed,
    Insert,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IngestStage::Embed => "embed",
            IngestStage::Insert => "insert",
        })
    }
}

/// Errors that can occur while ingesting a poem.
///
/// ```rust
/// use ingest::IngestError;
///
/// let err = IngestError::EmptyField { field: "title" };
/// assert_eq!(err.to_string(), "field `title` must not be empty");
/// assert!(err.is_validation());
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum IngestError {
    /// A required field is empty or whitespace-only.
    #[error("field `{field}` must not be empty")]
    EmptyField { field: &'static str },

    /// A field is longer than the configured limit.
    #[error("field `{field}` is {actual} bytes, limit is {limit}")]
    FieldTooLarge {
        field: &'static str,
        limit: usize,
        actual: usize,
    },

    /// Embedding the excerpt failed. Nothing was stored.
    #[error("embedding failed: {0}")]
    Embedding(#[from] SemanticError),

    /// Inserting into the index failed.
    #[error("index insert failed: {0}")]
    Index(#[from] IndexError),

    /// A call did not finish within its deadline. For `Insert` the record may
    /// or may not have been stored.
    #[error("{stage} timed out after {}ms", after.as_millis())]
    Timeout { stage: IngestStage, after: Duration },
}

impl IngestError {
    /// True for errors caused by the submission itself.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IngestError::EmptyField { .. } | IngestError::FieldTooLarge { .. }
        )
    }

    /// Name of the offending field for validation errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            IngestError::EmptyField { field } | IngestError::FieldTooLarge { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}
