use async_trait::async_trait;
use serde_json::json;

use crate::http::ChatClient;
use crate::{ChatMessage, GenerationConfig, GenerationError};

/// The generative collaborator behind [`CandidateSelector`](crate::CandidateSelector).
///
/// Returns best-effort free text. Nothing about its structure is guaranteed.
#[async_trait]
pub trait PoemWriter: Send + Sync {
    async fn write(&self, messages: &[ChatMessage]) -> Result<String, GenerationError>;
}

/// [`PoemWriter`] backed by an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsWriter {
    client: ChatClient,
    model: String,
    temperature: f32,
}

impl ChatCompletionsWriter {
    pub fn new(cfg: &GenerationConfig) -> Result<Self, GenerationError> {
        cfg.validate()?;
        Ok(Self {
            client: ChatClient::new(cfg)?,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
        })
    }
}

#[async_trait]
impl PoemWriter for ChatCompletionsWriter {
    async fn write(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        let payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });
        let text = self.client.complete(&payload).await?;
        tracing::debug!(model = %self.model, chars = text.chars().count(), "writer responded");
        Ok(text)
    }
}
