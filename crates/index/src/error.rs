use thiserror::Error;

/// Errors produced by a [`VectorIndex`](crate::VectorIndex).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// `search` was called on an index holding zero records.
    #[error("index is empty")]
    EmptyIndex,
    /// A vector does not have the index dimension. Indicates index/model skew.
    #[error("dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("invalid index config: {0}")]
    InvalidConfig(String),
    /// The storage engine failed.
    #[error("backend error: {0}")]
    Backend(String),
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

#[cfg(feature = "backend-postgres")]
impl From<sqlx::Error> for IndexError {
    fn from(e: sqlx::Error) -> Self {
        IndexError::Backend(e.to_string())
    }
}
