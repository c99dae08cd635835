use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the index on insert. Increases with insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoemId(pub i64);

impl fmt::Display for PoemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A poem waiting to be stored. The index assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPoem {
    pub title: String,
    pub author: String,
    pub excerpt: String,
    pub source: String,
    pub embedding: Vec<f32>,
}

/// A stored poem. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoemRecord {
    pub id: PoemId,
    pub title: String,
    pub author: String,
    pub excerpt: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl PoemRecord {
    pub(crate) fn from_new(id: PoemId, poem: NewPoem) -> Self {
        Self {
            id,
            title: poem.title,
            author: poem.author,
            excerpt: poem.excerpt,
            source: poem.source,
            embedding: poem.embedding,
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoem {
    pub record: PoemRecord,
    /// `1 - <record, query>`; smaller is closer, 0 for identical unit vectors.
    pub distance: f32,
}

/// Search hits ordered by ascending distance, ties by ascending id.
pub type SimilarityResult = Vec<ScoredPoem>;
