//! Pivot permutations: the ranking of all pivots by distance to one object.

use crate::types::{Permutation, PivotId};

/// Convert a vector of pivot distances into a permutation: pivot ids sorted
/// by ascending distance, ties broken by ascending pivot id.
///
/// The output has the same length as `dists` and contains each pivot id
/// exactly once.
pub fn permutation_from_distances(dists: &[f32]) -> Permutation {
    let mut pairs: Vec<(f32, PivotId)> = dists
        .iter()
        .enumerate()
        .map(|(i, &d)| (d, i as PivotId))
        .collect();
    // Lexicographic on (distance, pivot id); total_cmp keeps the order total
    // even for NaN distances from degenerate spaces.
    pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    pairs.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_by_distance() {
        let perm = permutation_from_distances(&[4.0, 1.0, 5.0]);
        assert_eq!(perm, vec![1, 0, 2]);
    }

    #[test]
    fn test_ties_break_by_pivot_id() {
        let perm = permutation_from_distances(&[2.0, 1.0, 2.0, 1.0]);
        assert_eq!(perm, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_contains_every_pivot_once() {
        let dists: Vec<f32> = (0..64).map(|i| ((i * 37) % 64) as f32).collect();
        let mut perm = permutation_from_distances(&dists);
        perm.sort_unstable();
        assert_eq!(perm, (0..64).collect::<Vec<_>>());
    }
}
