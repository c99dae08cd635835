use async_trait::async_trait;
use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;
use crate::{EmbeddingGateway, SemanticConfig, SemanticEmbedding, SemanticError};

/// Deterministic gateway used in `"fast"` mode and in tests.
///
/// Each coordinate is derived from a hash of the text and the coordinate index, so
/// equal texts map to equal vectors and distinct texts land far apart. No network.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    model_name: String,
    dimension: usize,
    normalize: bool,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            model_name: "stub".into(),
            dimension,
            normalize: true,
        }
    }

    pub fn from_config(cfg: &SemanticConfig) -> Self {
        Self {
            model_name: cfg.model_name.clone(),
            dimension: cfg.dimension,
            normalize: cfg.normalize,
        }
    }

    pub fn embed_sync(&self, text: &str) -> SemanticEmbedding {
        let seed = hash64(text.as_bytes());
        let mut v: Vec<f32> = (0..self.dimension as u64)
            .map(|idx| {
                let h = hash64(&(seed, idx));
                // map to [-1, 1]
                ((h >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0) as f32
            })
            .collect();
        if self.normalize {
            l2_normalize_in_place(&mut v);
        }
        SemanticEmbedding {
            vector: v,
            model_name: self.model_name.clone(),
            embedding_dim: self.dimension,
            normalized: self.normalize,
        }
    }
}

#[async_trait]
impl EmbeddingGateway for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<SemanticEmbedding, SemanticError> {
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::l2_norm;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn stub_is_deterministic() {
        let stub = StubEmbedder::new(64);
        let a = stub.embed_sync("바다 위의 노을");
        let b = stub.embed_sync("바다 위의 노을");
        assert_eq!(a.vector, b.vector);
        assert_eq!(a.embedding_dim, 64);
        assert!(a.normalized);
    }

    #[test]
    fn different_text_gives_different_vectors() {
        let stub = StubEmbedder::new(64);
        let a = stub.embed_sync("hello world");
        let b = stub.embed_sync("goodbye world");
        assert_ne!(a.vector, b.vector);
        assert!(dot(&a.vector, &b.vector) < 0.9);
    }

    #[test]
    fn normalized_vectors_have_unit_norm() {
        let stub = StubEmbedder::new(128);
        let e = stub.embed_sync("test text");
        assert!((l2_norm(&e.vector) - 1.0).abs() < 1e-4);
        assert!((dot(&e.vector, &e.vector) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn from_config_respects_normalize_flag() {
        let cfg = SemanticConfig {
            normalize: false,
            ..SemanticConfig::stub(8)
        };
        let e = StubEmbedder::from_config(&cfg).embed_sync("raw");
        assert_eq!(e.vector.len(), 8);
        assert!(!e.normalized);
        assert!(e.vector.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[tokio::test]
    async fn gateway_trait_returns_same_vector() {
        let stub = StubEmbedder::new(16);
        let via_trait = stub.embed("moonlight").await.unwrap();
        assert_eq!(via_trait.vector, stub.embed_sync("moonlight").vector);
        assert_eq!(stub.dimension(), 16);
        assert_eq!(stub.model_name(), "stub");
    }
}
