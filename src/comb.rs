//! Tuple-ID encoding: unordered pivot tuples to dense posting ids.
//!
//! Every unordered c-subset of the pivots in an object's permutation prefix
//! maps to one integer. The encoding is the canonical lexicographic rank, so
//! it is a bijection between unordered tuples over `[0, P)` and a dense
//! integer range; builder and query consult the same functions and therefore
//! always agree. A skip filter with stride `s` keeps only raw ranks
//! divisible by `s` and emits `rank / s`, shrinking the posting space at the
//! cost of recall.

use crate::types::{PivotId, PostingId};

/// Lexicographic rank of the unordered pair `{a, b}`, `a != b`.
///
/// Symmetric in its arguments; a bijection onto `[0, P(P-1)/2)` for pivot
/// ids drawn from `[0, P)`.
#[inline]
pub fn pair_rank(a: PivotId, b: PivotId) -> u64 {
    debug_assert_ne!(a, b);
    let (hi, lo) = if a > b { (a as u64, b as u64) } else { (b as u64, a as u64) };
    hi * (hi - 1) / 2 + lo
}

/// Lexicographic rank of the unordered triple `{a, b, c}`, all distinct.
///
/// Symmetric in its arguments; a bijection onto `[0, C(P,3))` for pivot ids
/// drawn from `[0, P)`.
#[inline]
pub fn triple_rank(a: PivotId, b: PivotId, c: PivotId) -> u64 {
    debug_assert!(a != b && b != c && a != c);
    let mut v = [a as u64, b as u64, c as u64];
    v.sort_unstable();
    let [lo, mid, hi] = v;
    hi * (hi - 1) * (hi - 2) / 6 + mid * (mid - 1) / 2 + lo
}

/// Number of unordered c-subsets of an n-element set, for c in {1, 2, 3}.
#[inline]
pub fn tuple_count(n: usize, comb_qty: usize) -> u64 {
    let n = n as u64;
    match comb_qty {
        1 => n,
        2 => n * n.saturating_sub(1) / 2,
        3 => n * n.saturating_sub(1) * n.saturating_sub(2) / 6,
        _ => unreachable!("comb_qty validated to 1..=3"),
    }
}

/// Size of the dense posting-id space: `ceil(rawspace(P, c) / s)`.
#[inline]
pub fn posting_space(num_pivot: usize, comb_qty: usize, skip_val: usize) -> u64 {
    tuple_count(num_pivot, comb_qty).div_ceil(skip_val as u64)
}

/// Enumerate the posting ids for the first `prefix_size` entries of `perm`.
///
/// Emits `rank / skip_val` for every unordered `comb_qty`-subset of the
/// prefix pivots whose raw rank is divisible by `skip_val`. The output
/// buffer is cleared first and grows as needed; ordering is deterministic
/// but otherwise unspecified.
pub fn gen_comb_ids(
    perm: &[PivotId],
    prefix_size: usize,
    comb_qty: usize,
    skip_val: usize,
    out: &mut Vec<PostingId>,
) {
    debug_assert!(prefix_size <= perm.len());
    let s = skip_val as u64;
    out.clear();

    match comb_qty {
        1 => {
            for &pivot in &perm[..prefix_size] {
                let rank = pivot as u64;
                if rank % s == 0 {
                    out.push((rank / s) as PostingId);
                }
            }
        }
        2 => {
            for j in 1..prefix_size {
                for k in 0..j {
                    let rank = pair_rank(perm[j], perm[k]);
                    if rank % s == 0 {
                        out.push((rank / s) as PostingId);
                    }
                }
            }
        }
        3 => {
            for j in 2..prefix_size {
                for k in 1..j {
                    for l in 0..k {
                        let rank = triple_rank(perm[j], perm[k], perm[l]);
                        if rank % s == 0 {
                            out.push((rank / s) as PostingId);
                        }
                    }
                }
            }
        }
        _ => unreachable!("comb_qty validated to 1..=3"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pair_rank_bijection() {
        let p = 24u32;
        let mut seen = HashSet::new();
        for a in 0..p {
            for b in 0..a {
                let rank = pair_rank(a, b);
                assert_eq!(rank, pair_rank(b, a), "must be symmetric");
                assert!(rank < tuple_count(p as usize, 2));
                assert!(seen.insert(rank), "rank {} repeated", rank);
            }
        }
        assert_eq!(seen.len() as u64, tuple_count(p as usize, 2));
    }

    #[test]
    fn test_triple_rank_bijection() {
        let p = 16u32;
        let mut seen = HashSet::new();
        for a in 0..p {
            for b in 0..a {
                for c in 0..b {
                    let rank = triple_rank(a, b, c);
                    assert_eq!(rank, triple_rank(c, a, b), "must be symmetric");
                    assert!(rank < tuple_count(p as usize, 3));
                    assert!(seen.insert(rank));
                }
            }
        }
        assert_eq!(seen.len() as u64, tuple_count(p as usize, 3));
    }

    #[test]
    fn test_posting_space_rounds_up() {
        assert_eq!(posting_space(5, 2, 1), 10);
        assert_eq!(posting_space(5, 2, 3), 4); // ceil(10 / 3)
        assert_eq!(posting_space(6, 3, 1), 20);
    }

    #[test]
    fn test_singleton_uses_pivot_identity() {
        // The raw rank for c=1 is the pivot id itself, not the prefix slot.
        let perm = vec![7, 2, 5, 0];
        let mut out = Vec::new();
        gen_comb_ids(&perm, 3, 1, 1, &mut out);
        assert_eq!(out, vec![7, 2, 5]);
    }

    #[test]
    fn test_singleton_skip_filter() {
        let perm = vec![6, 1, 3, 9, 0];
        let mut out = Vec::new();
        gen_comb_ids(&perm, 5, 1, 3, &mut out);
        // Only pivot ids divisible by 3 survive, emitted as id / 3.
        assert_eq!(out, vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_pair_output_count() {
        let perm: Vec<PivotId> = (0..32).collect();
        let mut out = Vec::new();
        gen_comb_ids(&perm, 10, 2, 1, &mut out);
        assert_eq!(out.len() as u64, tuple_count(10, 2));
        let unique: HashSet<_> = out.iter().collect();
        assert_eq!(unique.len(), out.len(), "distinct tuples, distinct ids");
    }

    #[test]
    fn test_triple_output_count() {
        let perm: Vec<PivotId> = (0..16).collect();
        let mut out = Vec::new();
        gen_comb_ids(&perm, 8, 3, 1, &mut out);
        assert_eq!(out.len() as u64, tuple_count(8, 3));
    }

    #[test]
    fn test_output_cleared_between_calls() {
        let perm = vec![1, 2, 3];
        let mut out = vec![99, 98, 97];
        gen_comb_ids(&perm, 2, 1, 1, &mut out);
        assert_eq!(out, vec![1, 2]);
    }
}
