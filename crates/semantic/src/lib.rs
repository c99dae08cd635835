//! Embedding gateway for photopoem.
//!
//! Turns a piece of text into a fixed-dimension vector that can be compared
//! against the poem index. Two implementations ship with the crate:
//!
//! - **API mode** ([`ApiEmbedder`]) calls a remote embedding service. OpenAI,
//!   Hugging Face and a minimal `{"text": ...}` protocol are understood.
//! - **Fast mode** ([`StubEmbedder`]) hashes the text into a deterministic
//!   vector. No network, used by tests and local demos.
//!
//! Every vector leaving a gateway has exactly the configured dimension and only
//! finite values. Providers that hand back the array JSON-encoded inside a
//! string get one chance to be parsed; anything still malformed surfaces as
//! [`SemanticError::Format`] so callers can tell it apart from an outage.
//!
//! Retries are not done here. The orchestrator owns the retry budget and uses
//! [`SemanticError::is_retryable`] to decide.
//!
//! ```
//! use semantic::{build_gateway, SemanticConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), semantic::SemanticError> {
//! let gateway = build_gateway(&SemanticConfig::stub(32))?;
//! let embedding = gateway.embed("a quiet harbor at dusk").await?;
//! assert_eq!(embedding.vector.len(), 32);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod types;

mod api;
mod normalize;
mod stub;
mod vector;

use async_trait::async_trait;
use std::sync::Arc;

pub use api::ApiEmbedder;
pub use config::SemanticConfig;
pub use error::SemanticError;
pub use normalize::{l2_norm, l2_normalize_in_place};
pub use stub::StubEmbedder;
pub use types::SemanticEmbedding;
pub use vector::{check_vector, validate_embedding};

/// Something that can turn text into an embedding.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    /// Embed `text`. The returned vector has exactly [`dimension`](Self::dimension) entries.
    async fn embed(&self, text: &str) -> Result<SemanticEmbedding, SemanticError>;

    /// Dimension of every vector this gateway returns.
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Builds the gateway selected by `cfg.mode`.
pub fn build_gateway(cfg: &SemanticConfig) -> Result<Arc<dyn EmbeddingGateway>, SemanticError> {
    cfg.validate()?;
    match cfg.mode.to_ascii_lowercase().as_str() {
        "fast" | "stub" => {
            tracing::info!(dimension = cfg.dimension, "using stub embedding gateway");
            Ok(Arc::new(StubEmbedder::from_config(cfg)))
        }
        _ => {
            tracing::info!(
                model = %cfg.model_name,
                dimension = cfg.dimension,
                provider = cfg.api_provider.as_deref().unwrap_or("openai"),
                "using remote embedding gateway"
            );
            Ok(Arc::new(ApiEmbedder::new(cfg)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_gateway_picks_stub_for_fast_mode() {
        let gateway = build_gateway(&SemanticConfig::stub(24)).unwrap();
        assert_eq!(gateway.dimension(), 24);
        assert_eq!(gateway.model_name(), "stub");
    }

    #[test]
    fn build_gateway_picks_api_for_api_mode() {
        let cfg = SemanticConfig {
            api_url: Some("http://localhost:1/embed".into()),
            dimension: 4,
            ..Default::default()
        };
        let gateway = build_gateway(&cfg).unwrap();
        assert_eq!(gateway.dimension(), 4);
        assert_eq!(gateway.model_name(), "text-embedding-3-small");
    }

    #[test]
    fn build_gateway_rejects_invalid_config() {
        let cfg = SemanticConfig {
            mode: "onnx".into(),
            ..Default::default()
        };
        assert!(build_gateway(&cfg).is_err());
    }

    #[tokio::test]
    async fn gateway_is_usable_as_trait_object() {
        let gateway: Arc<dyn EmbeddingGateway> = Arc::new(StubEmbedder::new(8));
        let a = gateway.embed("same").await.unwrap();
        let b = gateway.embed("same").await.unwrap();
        assert_eq!(a, b);
        assert!(check_vector(&a.vector, 8).is_ok());
    }
}
