use thiserror::Error;

/// Errors that can occur while fusing query signals.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FusionError {
    /// Caption, free text and mood tag are all absent or whitespace-only.
    #[error("at least one of image caption, free text or mood tag is required")]
    InvalidSignals,
}
