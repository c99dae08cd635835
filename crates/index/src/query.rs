use hashbrown::HashSet;
use std::cmp::Ordering;

use crate::{IndexError, PoemRecord, ScoredPoem, SimilarityResult};

/// Chunk size for the dot product loop
const SIMD_CHUNK_SIZE: usize = 32;

/// Inner-product distance: `1 - <a, b>`.
///
/// Matches pgvector's `1 + (a <#> b)` so both backends rank identically.
#[inline]
pub fn inner_product_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - dot(a, b)
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    let chunks_a = a.chunks_exact(SIMD_CHUNK_SIZE);
    let chunks_b = b.chunks_exact(SIMD_CHUNK_SIZE);
    let tail: f32 = chunks_a
        .remainder()
        .iter()
        .zip(chunks_b.remainder())
        .map(|(x, y)| x * y)
        .sum();
    chunks_a
        .zip(chunks_b)
        .map(|(ca, cb)| ca.iter().zip(cb).map(|(x, y)| x * y).sum::<f32>())
        .sum::<f32>()
        + tail
}

pub(crate) fn check_dimension(expected: usize, vector: &[f32]) -> Result<(), IndexError> {
    if vector.len() != expected {
        return Err(IndexError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_k(k: usize) -> Result<(), IndexError> {
    if k == 0 {
        return Err(IndexError::InvalidQuery("k must be greater than zero".into()));
    }
    Ok(())
}

/// Exact top-k over `records`.
pub(crate) fn rank<'a, I>(records: I, query: &[f32], k: usize) -> SimilarityResult
where
    I: IntoIterator<Item = &'a PoemRecord>,
{
    let mut seen = HashSet::new();
    let mut results: Vec<ScoredPoem> = records
        .into_iter()
        .filter(|rec| seen.insert(rec.id))
        .map(|rec| ScoredPoem {
            distance: inner_product_distance(&rec.embedding, query),
            record: rec.clone(),
        })
        .collect();

    sort_hits(&mut results);
    results.truncate(k);
    results
}

/// Ascending distance, ties broken by id so equal scores come back in insertion order.
pub(crate) fn sort_hits(hits: &mut [ScoredPoem]) {
    hits.sort_unstable_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PoemId;

    fn rec(id: i64, embedding: &[f32]) -> PoemRecord {
        PoemRecord {
            id: PoemId(id),
            title: format!("title-{id}"),
            author: "author".into(),
            excerpt: "excerpt".into(),
            source: "source".into(),
            embedding: embedding.to_vec(),
        }
    }

    #[test]
    fn distance_is_zero_for_identical_unit_vectors() {
        let v = [0.6f32, 0.8];
        assert!(inner_product_distance(&v, &v).abs() < 1e-6);
        assert!((inner_product_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((inner_product_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn chunked_dot_matches_scalar() {
        let a: Vec<f32> = (0..100).map(|i| (i as f32 * 0.37).sin()).collect();
        let b: Vec<f32> = (0..100).map(|i| (i as f32 * 0.11).cos()).collect();
        let scalar: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        assert!((dot(&a, &b) - scalar).abs() < 1e-4);
    }

    #[test]
    fn rank_orders_by_distance_then_id() {
        let records = vec![
            rec(3, &[1.0, 0.0]),
            rec(1, &[1.0, 0.0]),
            rec(2, &[0.0, 1.0]),
        ];
        let hits = rank(&records, &[1.0, 0.0], 3);
        let ids: Vec<i64> = hits.iter().map(|h| h.record.id.0).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn rank_truncates_and_drops_duplicate_ids() {
        let records = vec![
            rec(1, &[1.0, 0.0]),
            rec(1, &[1.0, 0.0]),
            rec(2, &[0.7, 0.7]),
            rec(3, &[0.0, 1.0]),
        ];
        let hits = rank(&records, &[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.id, PoemId(1));
        assert_eq!(hits[1].record.id, PoemId(2));
    }

    #[test]
    fn k_and_dimension_checks() {
        assert!(check_k(0).is_err());
        assert!(check_k(1).is_ok());
        assert_eq!(
            check_dimension(3, &[1.0]),
            Err(IndexError::DimensionMismatch {
                expected: 3,
                actual: 1
            })
        );
    }
}
