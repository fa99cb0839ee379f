//! Distance spaces over arbitrary point types.
//!
//! The index never interprets points itself: it only asks the space for
//! distances (directly or through a pivot-distance oracle) and stores object
//! ids. Any symmetric or asymmetric, metric or non-metric dissimilarity
//! works, as long as smaller means closer.

use crate::error::{Result, TupeloError};
use std::path::Path;

/// A (possibly non-metric) distance space over points of type [`Space::Point`].
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: distances are computed from rayon
/// worker threads during index construction.
pub trait Space: Send + Sync + 'static {
    /// The point type this space measures distances between.
    type Point: Clone + Send + Sync + 'static;

    /// Distance from `a` to `b`. Smaller is closer. The value is not
    /// required to satisfy the triangle inequality or symmetry.
    fn distance(&self, a: &Self::Point, b: &Self::Point) -> f32;

    /// Read a dataset of points from a file, e.g. to load an external pivot
    /// set. Spaces that have no serialized point format keep the default,
    /// which rejects the operation.
    fn read_dataset(&self, path: &Path, expected_qty: usize) -> Result<Vec<Self::Point>> {
        let _ = expected_qty;
        Err(TupeloError::not_supported(format!(
            "this space cannot read points from '{}'",
            path.display()
        )))
    }
}

/// Euclidean (L2) distance over dense `f32` vectors.
///
/// The vectors of a dataset must share one dimensionality; mismatches are a
/// caller bug and only checked in debug builds.
#[derive(Debug, Default, Clone, Copy)]
pub struct EuclideanSpace;

impl Space for EuclideanSpace {
    type Point = Vec<f32>;

    fn distance(&self, a: &Self::Point, b: &Self::Point) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum::<f32>()
            .sqrt()
    }
}
