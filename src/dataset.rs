//! Dataset utilities for generating synthetic data and evaluating recall.

use crate::query::SearchResult;
use crate::space::Space;
use crate::types::ObjectId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Generate `qty` random vectors of dimension `dim` with coordinates
/// uniformly distributed in [-1.0, 1.0].
pub fn random_vectors(qty: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..qty)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

/// Exact k nearest neighbors by linear scan, for ground truth.
pub fn brute_force_knn<S: Space>(
    space: &S,
    data: &[S::Point],
    query: &S::Point,
    k: usize,
) -> Vec<SearchResult> {
    let mut scored: Vec<SearchResult> = data
        .iter()
        .enumerate()
        .map(|(id, obj)| SearchResult::new(id as ObjectId, space.distance(query, obj)))
        .collect();
    scored.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
    scored.truncate(k);
    scored
}

/// Fraction of ground-truth ids present in the found set.
pub fn recall_at_k(found: &[SearchResult], truth: &[SearchResult]) -> f32 {
    if truth.is_empty() {
        return 1.0;
    }
    let found_ids: HashSet<ObjectId> = found.iter().map(|r| r.id).collect();
    let hits = truth.iter().filter(|r| found_ids.contains(&r.id)).count();
    hits as f32 / truth.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::EuclideanSpace;

    #[test]
    fn test_random_vectors_shape() {
        let data = random_vectors(10, 4, 1);
        assert_eq!(data.len(), 10);
        assert!(data.iter().all(|v| v.len() == 4));
        assert_eq!(data, random_vectors(10, 4, 1), "seeded generation repeats");
    }

    #[test]
    fn test_brute_force_knn_exact() {
        let space = EuclideanSpace;
        let data: Vec<Vec<f32>> = (0..10).map(|i| vec![i as f32]).collect();
        let query = vec![3.2f32];
        let truth = brute_force_knn(&space, &data, &query, 3);
        let ids: Vec<ObjectId> = truth.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 4, 2]);
    }

    #[test]
    fn test_recall() {
        let truth = vec![SearchResult::new(1, 0.1), SearchResult::new(2, 0.2)];
        let found = vec![SearchResult::new(2, 0.2), SearchResult::new(9, 0.9)];
        assert!((recall_at_k(&found, &truth) - 0.5).abs() < 1e-6);
        assert_eq!(recall_at_k(&found, &[]), 1.0);
    }
}
