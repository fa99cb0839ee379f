//! Query objects: the final distance check and result maintenance.
//!
//! The index hands every surviving candidate to the query object's
//! `check_and_add`; the query computes the real distance and keeps whatever
//! its result semantics dictate. Candidate order is not a contract, so both
//! query types here are order-insensitive.

use crate::space::Space;
use crate::types::ObjectId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A search result: an object id and its distance from the query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// The id of the matched object.
    pub id: ObjectId,
    /// The distance from the query point.
    pub distance: f32,
}

impl SearchResult {
    /// Create a new SearchResult.
    #[inline]
    pub fn new(id: ObjectId, distance: f32) -> Self {
        Self { id, distance }
    }
}

/// A query that receives candidates from the index.
pub trait Query<S: Space> {
    /// The query point candidates are measured against.
    fn point(&self) -> &S::Point;

    /// Evaluate one candidate and fold it into the result set.
    fn check_and_add(&mut self, id: ObjectId, obj: &S::Point);
}

/// A candidate with its computed distance, used for heap operations.
#[derive(Clone, Copy)]
struct ScoredCandidate {
    id: ObjectId,
    distance: f32,
}

impl PartialEq for ScoredCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl Eq for ScoredCandidate {}

impl PartialOrd for ScoredCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// k-nearest-neighbor query: keeps the k closest candidates seen so far.
pub struct KnnQuery<'a, S: Space> {
    space: &'a S,
    point: &'a S::Point,
    k: usize,
    // Max-heap: peek() is the current worst of the kept k.
    heap: BinaryHeap<ScoredCandidate>,
    dist_comp_qty: usize,
}

impl<'a, S: Space> KnnQuery<'a, S> {
    /// Create a query for the `k` nearest neighbors of `point`.
    pub fn new(space: &'a S, point: &'a S::Point, k: usize) -> Self {
        Self {
            space,
            point,
            k,
            heap: BinaryHeap::with_capacity(k + 1),
            dist_comp_qty: 0,
        }
    }

    /// Number of real distance evaluations performed so far.
    pub fn dist_comp_qty(&self) -> usize {
        self.dist_comp_qty
    }

    /// Consume the query, returning results sorted ascending by distance.
    pub fn into_results(self) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .heap
            .into_iter()
            .map(|sc| SearchResult::new(sc.id, sc.distance))
            .collect();
        results.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        results
    }
}

impl<S: Space> Query<S> for KnnQuery<'_, S> {
    fn point(&self) -> &S::Point {
        self.point
    }

    fn check_and_add(&mut self, id: ObjectId, obj: &S::Point) {
        if self.k == 0 {
            return;
        }
        let distance = self.space.distance(self.point, obj);
        self.dist_comp_qty += 1;

        if self.heap.len() < self.k {
            self.heap.push(ScoredCandidate { id, distance });
        } else if distance < self.heap.peek().map(|w| w.distance).unwrap_or(f32::INFINITY) {
            self.heap.pop();
            self.heap.push(ScoredCandidate { id, distance });
        }
    }
}

/// Range query: keeps every candidate within `radius` of the query point.
pub struct RangeQuery<'a, S: Space> {
    space: &'a S,
    point: &'a S::Point,
    radius: f32,
    results: Vec<SearchResult>,
    dist_comp_qty: usize,
}

impl<'a, S: Space> RangeQuery<'a, S> {
    /// Create a query for all objects within `radius` of `point`.
    pub fn new(space: &'a S, point: &'a S::Point, radius: f32) -> Self {
        Self {
            space,
            point,
            radius,
            results: Vec::new(),
            dist_comp_qty: 0,
        }
    }

    /// Number of real distance evaluations performed so far.
    pub fn dist_comp_qty(&self) -> usize {
        self.dist_comp_qty
    }

    /// Consume the query, returning results sorted ascending by distance.
    pub fn into_results(mut self) -> Vec<SearchResult> {
        self.results
            .sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        self.results
    }
}

impl<S: Space> Query<S> for RangeQuery<'_, S> {
    fn point(&self) -> &S::Point {
        self.point
    }

    fn check_and_add(&mut self, id: ObjectId, obj: &S::Point) {
        let distance = self.space.distance(self.point, obj);
        self.dist_comp_qty += 1;
        if distance <= self.radius {
            self.results.push(SearchResult::new(id, distance));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::EuclideanSpace;

    #[test]
    fn test_knn_keeps_k_closest() {
        let space = EuclideanSpace;
        let point = vec![0.0f32];
        let mut query = KnnQuery::new(&space, &point, 2);

        let objs: Vec<Vec<f32>> = vec![vec![5.0], vec![1.0], vec![3.0], vec![2.0]];
        for (id, obj) in objs.iter().enumerate() {
            query.check_and_add(id as ObjectId, obj);
        }
        assert_eq!(query.dist_comp_qty(), 4);

        let results = query.into_results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, 1);
        assert_eq!(results[1].id, 3);
        assert!(results[0].distance <= results[1].distance);
    }

    #[test]
    fn test_knn_zero_k() {
        let space = EuclideanSpace;
        let point = vec![0.0f32];
        let mut query = KnnQuery::new(&space, &point, 0);
        query.check_and_add(0, &vec![1.0]);
        assert!(query.into_results().is_empty());
    }

    #[test]
    fn test_range_filters_by_radius() {
        let space = EuclideanSpace;
        let point = vec![0.0f32];
        let mut query = RangeQuery::new(&space, &point, 2.5);

        for (id, obj) in [vec![1.0f32], vec![4.0], vec![2.5], vec![-2.0]]
            .iter()
            .enumerate()
        {
            query.check_and_add(id as ObjectId, obj);
        }

        let results = query.into_results();
        let ids: Vec<ObjectId> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 3, 2]);
    }
}
