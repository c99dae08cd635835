use fusion::QuerySignals;
use index::ScoredPoem;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::prompt::build_messages;
use crate::{GenerationConfig, GenerationError, PoemWriter};

/// Unvalidated writer output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RawGenerationOutput(String);

impl RawGenerationOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RawGenerationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asks the writer to pick one candidate and re-render it in contract layout.
#[derive(Clone)]
pub struct CandidateSelector {
    writer: Arc<dyn PoemWriter>,
    cfg: GenerationConfig,
}

impl CandidateSelector {
    pub fn new(writer: Arc<dyn PoemWriter>, cfg: GenerationConfig) -> Self {
        Self { writer, cfg }
    }

    pub async fn select(
        &self,
        signals: &QuerySignals,
        candidates: &[ScoredPoem],
    ) -> Result<RawGenerationOutput, GenerationError> {
        if candidates.is_empty() {
            return Err(GenerationError::NoCandidates);
        }
        let messages = build_messages(signals, candidates, &self.cfg);
        tracing::debug!(candidates = candidates.len(), "asking writer to select");
        self.writer
            .write(&messages)
            .await
            .map(RawGenerationOutput::new)
    }
}
