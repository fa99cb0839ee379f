//! Pivot sets and pivot-distance oracles.
//!
//! Pivots are the fixed reference objects every permutation is ranked
//! against. They are either sampled uniformly without replacement from the
//! dataset or loaded from an external file through the space. Distances to
//! the full pivot set come from a [`PivotDistanceOracle`]; the
//! [`DirectPivotDistances`] fallback simply calls the space once per pivot,
//! while an accelerated oracle may precompute or hash whatever it likes, as
//! long as index-time and query-time vectors agree.

use crate::error::{Result, TupeloError};
use crate::space::Space;
use crate::types::ObjectId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;

/// The pivot collection backing one index.
#[derive(Debug)]
pub struct PivotSet<P> {
    points: Vec<P>,
    /// Dataset positions of the pivots; present only when sampled.
    positions: Option<Vec<ObjectId>>,
}

impl<P: Clone> PivotSet<P> {
    /// Sample `qty` distinct pivots from the dataset.
    ///
    /// With a seed the selection is reproducible; otherwise it is seeded
    /// from entropy.
    pub fn sample(data: &[P], qty: usize, seed: Option<u64>) -> Result<Self> {
        if data.len() < qty {
            return Err(TupeloError::InsufficientPoints {
                required: qty,
                actual: data.len(),
            });
        }
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut indices: Vec<usize> = (0..data.len()).collect();
        indices.shuffle(&mut rng);
        indices.truncate(qty);

        let points = indices.iter().map(|&i| data[i].clone()).collect();
        let positions = indices.into_iter().map(|i| i as ObjectId).collect();
        Ok(Self {
            points,
            positions: Some(positions),
        })
    }

    /// Load `qty` pivots from a file through the space.
    pub fn load<S: Space<Point = P>>(space: &S, path: &Path, qty: usize) -> Result<Self> {
        let mut points = space.read_dataset(path, qty)?;
        if points.len() < qty {
            return Err(TupeloError::InsufficientPoints {
                required: qty,
                actual: points.len(),
            });
        }
        points.truncate(qty);
        Ok(Self {
            points,
            positions: None,
        })
    }

    /// Rebuild a sampled pivot set from saved dataset positions.
    pub fn from_positions(data: &[P], positions: Vec<ObjectId>) -> Result<Self> {
        let points = positions
            .iter()
            .map(|&pos| {
                data.get(pos as usize).cloned().ok_or_else(|| {
                    TupeloError::data_mismatch(format!(
                        "pivot position {} exceeds dataset size {}",
                        pos,
                        data.len()
                    ))
                })
            })
            .collect::<Result<Vec<P>>>()?;
        Ok(Self {
            points,
            positions: Some(positions),
        })
    }

    /// Number of pivots.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The pivot points.
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Dataset positions of sampled pivots, `None` for file-loaded sets.
    pub fn positions(&self) -> Option<&[ObjectId]> {
        self.positions.as_deref()
    }
}

/// Supplies the vector of distances from one point to every pivot.
///
/// Implementations may accelerate the computation (precomputed tables,
/// hashed pivot distances with `hash_trick_dim`, ...). Index-time and
/// query-time entry points are distinct because accelerated oracles often
/// treat the two differently.
pub trait PivotDistanceOracle<S: Space>: Send + Sync {
    /// Distances from a dataset object to all pivots, written into `out`.
    fn index_time_distances(
        &self,
        space: &S,
        pivots: &[S::Point],
        obj: &S::Point,
        out: &mut Vec<f32>,
    ) -> Result<()>;

    /// Distances from a query point to all pivots, written into `out`.
    fn query_time_distances(
        &self,
        space: &S,
        pivots: &[S::Point],
        query: &S::Point,
        out: &mut Vec<f32>,
    ) -> Result<()>;
}

/// Fallback oracle: one direct distance call per pivot.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectPivotDistances;

impl DirectPivotDistances {
    fn fill<S: Space>(space: &S, pivots: &[S::Point], point: &S::Point, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(pivots.len());
        out.extend(pivots.iter().map(|p| space.distance(point, p)));
    }
}

impl<S: Space> PivotDistanceOracle<S> for DirectPivotDistances {
    fn index_time_distances(
        &self,
        space: &S,
        pivots: &[S::Point],
        obj: &S::Point,
        out: &mut Vec<f32>,
    ) -> Result<()> {
        Self::fill(space, pivots, obj, out);
        Ok(())
    }

    fn query_time_distances(
        &self,
        space: &S,
        pivots: &[S::Point],
        query: &S::Point,
        out: &mut Vec<f32>,
    ) -> Result<()> {
        Self::fill(space, pivots, query, out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::EuclideanSpace;
    use std::collections::HashSet;

    #[test]
    fn test_sample_distinct_positions() {
        let data: Vec<Vec<f32>> = (0..100).map(|i| vec![i as f32]).collect();
        let pivots = PivotSet::sample(&data, 16, Some(7)).unwrap();
        assert_eq!(pivots.len(), 16);

        let positions: HashSet<_> = pivots.positions().unwrap().iter().collect();
        assert_eq!(positions.len(), 16, "sampling is without replacement");
    }

    #[test]
    fn test_sample_seed_reproducible() {
        let data: Vec<Vec<f32>> = (0..50).map(|i| vec![i as f32]).collect();
        let a = PivotSet::sample(&data, 8, Some(42)).unwrap();
        let b = PivotSet::sample(&data, 8, Some(42)).unwrap();
        assert_eq!(a.positions().unwrap(), b.positions().unwrap());
    }

    #[test]
    fn test_sample_insufficient_data() {
        let data: Vec<Vec<f32>> = (0..3).map(|i| vec![i as f32]).collect();
        let err = PivotSet::sample(&data, 8, None).unwrap_err();
        assert!(matches!(
            err,
            TupeloError::InsufficientPoints {
                required: 8,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_from_positions_validates() {
        let data: Vec<Vec<f32>> = (0..4).map(|i| vec![i as f32]).collect();
        assert!(PivotSet::from_positions(&data, vec![0, 3]).is_ok());
        let err = PivotSet::from_positions(&data, vec![0, 9]).unwrap_err();
        assert!(matches!(err, TupeloError::DataMismatch(_)));
    }

    #[test]
    fn test_direct_oracle_matches_space() {
        let space = EuclideanSpace;
        let pivots = vec![vec![0.0f32], vec![10.0], vec![-2.0]];
        let obj = vec![1.0f32];

        let mut out = Vec::new();
        DirectPivotDistances
            .index_time_distances(&space, &pivots, &obj, &mut out)
            .unwrap();
        assert_eq!(out, vec![1.0, 9.0, 3.0]);

        let mut out_q = Vec::new();
        DirectPivotDistances
            .query_time_distances(&space, &pivots, &obj, &mut out_q)
            .unwrap();
        assert_eq!(out, out_q);
    }
}
