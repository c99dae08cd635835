use serde::{Deserialize, Serialize};

/// A validated embedding returned by a gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticEmbedding {
    /// Exactly `embedding_dim` finite values.
    pub vector: Vec<f32>,
    /// Name of the model that produced the vector.
    pub model_name: String,
    /// Dimension of `vector`.
    pub embedding_dim: usize,
    /// Whether [`vector`](Self::vector) was L2-normalized by the gateway.
    pub normalized: bool,
}

impl SemanticEmbedding {
    pub fn into_vector(self) -> Vec<f32> {
        self.vector
    }
}
