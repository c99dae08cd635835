use async_trait::async_trait;
use std::sync::RwLock;

use crate::query::{check_dimension, check_k, rank};
use crate::{IndexError, NewPoem, PoemId, PoemRecord, SimilarityResult, VectorIndex};

/// Exact-search index held in process memory.
///
/// Ids come from a counter starting at 1, so ascending id equals insertion order.
pub struct InMemoryIndex {
    dimension: usize,
    records: RwLock<Vec<PoemRecord>>,
}

impl InMemoryIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn insert(&self, poem: NewPoem) -> Result<PoemRecord, IndexError> {
        check_dimension(self.dimension, &poem.embedding)?;
        // The write lock covers id assignment and the push.
        let mut guard = self
            .records
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let id = PoemId(guard.len() as i64 + 1);
        let record = PoemRecord::from_new(id, poem);
        guard.push(record.clone());
        Ok(record)
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<SimilarityResult, IndexError> {
        check_k(k)?;
        check_dimension(self.dimension, query)?;
        let guard = self
            .records
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        if guard.is_empty() {
            return Err(IndexError::EmptyIndex);
        }
        Ok(rank(guard.iter(), query, k))
    }

    async fn len(&self) -> Result<usize, IndexError> {
        Ok(self
            .records
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poem(title: &str, embedding: &[f32]) -> NewPoem {
        NewPoem {
            title: title.into(),
            author: "김소월".into(),
            excerpt: format!("{title} excerpt"),
            source: "진달래꽃 (1925)".into(),
            embedding: embedding.to_vec(),
        }
    }

    #[tokio::test]
    async fn insert_then_search_own_embedding_is_closest() {
        let index = InMemoryIndex::new(2);
        index.insert(poem("a", &[1.0, 0.0])).await.unwrap();
        let b = index.insert(poem("b", &[0.6, 0.8])).await.unwrap();
        index.insert(poem("c", &[0.0, 1.0])).await.unwrap();

        let hits = index.search(&[0.6, 0.8], 3).await.unwrap();
        assert_eq!(hits[0].record.id, b.id);
        assert!(hits[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn ids_increase_with_insertion_order() {
        let index = InMemoryIndex::new(2);
        let first = index.insert(poem("a", &[1.0, 0.0])).await.unwrap();
        let second = index.insert(poem("a", &[1.0, 0.0])).await.unwrap();
        assert_eq!(first.id, PoemId(1));
        assert_eq!(second.id, PoemId(2));
        assert_eq!(index.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn empty_index_is_an_error() {
        let index = InMemoryIndex::new(2);
        assert_eq!(
            index.search(&[1.0, 0.0], 1).await,
            Err(IndexError::EmptyIndex)
        );
        assert!(index.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn fewer_than_k_records_is_not_an_error() {
        let index = InMemoryIndex::new(2);
        index.insert(poem("a", &[1.0, 0.0])).await.unwrap();
        let hits = index.search(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected_without_insert() {
        let index = InMemoryIndex::new(3);
        let err = index.insert(poem("a", &[1.0, 0.0])).await.unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(index.len().await.unwrap(), 0);

        index.insert(poem("b", &[1.0, 0.0, 0.0])).await.unwrap();
        assert!(matches!(
            index.search(&[1.0], 1).await,
            Err(IndexError::DimensionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn zero_k_is_invalid() {
        let index = InMemoryIndex::new(1);
        index.insert(poem("a", &[1.0])).await.unwrap();
        assert!(matches!(
            index.search(&[1.0], 0).await,
            Err(IndexError::InvalidQuery(_))
        ));
    }

    #[tokio::test]
    async fn equal_distances_come_back_in_insertion_order() {
        let index = InMemoryIndex::new(2);
        for title in ["x", "y", "z"] {
            index.insert(poem(title, &[0.0, 1.0])).await.unwrap();
        }
        let hits = index.search(&[0.0, 1.0], 3).await.unwrap();
        let titles: Vec<&str> = hits.iter().map(|h| h.record.title.as_str()).collect();
        assert_eq!(titles, vec!["x", "y", "z"]);
    }
}
