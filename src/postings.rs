//! Posting lists and the sorted-union merge used by the Merge algorithm.

use crate::types::ObjectId;

/// One posting list: object ids indexed under a single posting id.
///
/// Sorted ascending after build. Duplicates are permitted: distinct tuples
/// can collide on one posting id under the skip filter, and an object that
/// contributes through both appears twice.
pub type PostingList = Vec<ObjectId>;

/// An object id paired with its accumulated overlap count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCount {
    /// Object id.
    pub id: ObjectId,
    /// Accumulated contribution, in units of `skip_val` per matched entry.
    pub qty: u32,
}

/// Sorted union of an id/count list with one posting list.
///
/// `out` is rebuilt from scratch: ids present in either input appear once,
/// sorted ascending, with counts carried over from `prev` and bumped by
/// `weight` for every matching entry of `post` (duplicate entries in `post`
/// each contribute `weight`).
pub fn post_list_union(prev: &[IdCount], post: &[ObjectId], out: &mut Vec<IdCount>, weight: u32) {
    out.clear();
    out.reserve(prev.len() + post.len());

    let mut i = 0;
    let mut j = 0;
    while i < prev.len() && j < post.len() {
        if prev[i].id < post[j] {
            out.push(prev[i]);
            i += 1;
        } else if prev[i].id > post[j] {
            bump_or_push(out, post[j], weight);
            j += 1;
        } else {
            out.push(IdCount {
                id: prev[i].id,
                qty: prev[i].qty + weight,
            });
            i += 1;
            j += 1;
        }
    }
    out.extend_from_slice(&prev[i..]);
    for &id in &post[j..] {
        bump_or_push(out, id, weight);
    }
}

#[inline]
fn bump_or_push(out: &mut Vec<IdCount>, id: ObjectId, weight: u32) {
    match out.last_mut() {
        Some(last) if last.id == id => last.qty += weight,
        _ => out.push(IdCount { id, qty: weight }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(u32, u32)]) -> Vec<IdCount> {
        pairs.iter().map(|&(id, qty)| IdCount { id, qty }).collect()
    }

    #[test]
    fn test_union_from_empty() {
        let mut out = Vec::new();
        post_list_union(&[], &[1, 4, 9], &mut out, 1);
        assert_eq!(out, counts(&[(1, 1), (4, 1), (9, 1)]));
    }

    #[test]
    fn test_union_accumulates_matches() {
        let prev = counts(&[(1, 2), (4, 1), (7, 3)]);
        let mut out = Vec::new();
        post_list_union(&prev, &[4, 5, 7], &mut out, 1);
        assert_eq!(out, counts(&[(1, 2), (4, 2), (5, 1), (7, 4)]));
    }

    #[test]
    fn test_union_weight_is_skip_val() {
        let prev = counts(&[(2, 3)]);
        let mut out = Vec::new();
        post_list_union(&prev, &[2, 8], &mut out, 5);
        assert_eq!(out, counts(&[(2, 8), (8, 5)]));
    }

    #[test]
    fn test_union_duplicate_posting_entries() {
        // An encoder collision puts one object twice in the same list; each
        // occurrence contributes the full weight.
        let prev = counts(&[(3, 1)]);
        let mut out = Vec::new();
        post_list_union(&prev, &[3, 3, 6, 6], &mut out, 2);
        assert_eq!(out, counts(&[(3, 5), (6, 4)]));
    }

    #[test]
    fn test_union_stays_sorted_unique() {
        let prev = counts(&[(0, 1), (5, 1), (10, 1)]);
        let mut out = Vec::new();
        post_list_union(&prev, &[2, 5, 11], &mut out, 1);
        let ids: Vec<u32> = out.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 2, 5, 10, 11]);
    }
}
