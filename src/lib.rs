//! tupelo: higher-order neighborhood approximation (NAPP) indexing for
//! similarity search in arbitrary, possibly non-metric, distance spaces.
//!
//! Classic NAPP indexes every object under its closest pivots individually.
//! This crate indexes *unordered tuples* of close pivots, pairs or triples
//! drawn from the top of each object's pivot ranking, which sharpens the
//! neighborhood signal at the cost of a combinatorially larger posting
//! space. A query computes the same tuple set and keeps the objects sharing
//! at least a scaled threshold of tuples, then re-ranks the survivors with
//! real distance evaluations.
//!
//! # Features
//!
//! - **Arbitrary spaces**: any `Space` implementation works, metric or not
//! - **Parallel build**: work-partitioned construction with per-thread
//!   scratch postings and bounded-memory flushes (Rayon)
//! - **Four query algorithms**: Scan, StoreSort, Merge, and a
//!   document-at-a-time PriorityQueue, selectable per query batch
//! - **Pluggable pivot oracles**: accelerate query-to-pivot distances, or
//!   fall back to direct distance calls
//! - **Persistence**: a self-checking textual format that verifies the
//!   index against its dataset at load time
//!
//! # Quick Start
//!
//! ```
//! use tupelo::{EuclideanSpace, IndexParams, NappHorderIndex, QueryParams};
//!
//! // In practice, load your embeddings.
//! let data = tupelo::dataset::random_vectors(1000, 16, 42);
//!
//! let params = IndexParams {
//!     num_pivot: 64,
//!     num_prefix: 8,
//!     pivot_comb_qty: 2,
//!     pivot_seed: Some(1),
//!     ..Default::default()
//! };
//! let mut index = NappHorderIndex::build(EuclideanSpace, data, params).unwrap();
//! index
//!     .set_query_time_params(QueryParams {
//!         min_times: 2,
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let query = vec![0.0f32; 16];
//! let results = index.search_knn(&query, 10).unwrap();
//! for r in &results {
//!     println!("object {} at distance {}", r.id, r.distance);
//! }
//! ```
//!
//! # Choosing a query algorithm
//!
//! | Algorithm       | Memory                | Best when                        |
//! |-----------------|-----------------------|----------------------------------|
//! | `Scan`          | O(N) counter array    | many short posting lists         |
//! | `StoreSort`     | O(postings touched)   | default; large N, modest overlap |
//! | `Merge`         | O(candidate breadth)  | few lists, cache-friendly        |
//! | `PriorityQueue` | O(lists touched)      | very many lists, sparse overlap  |
//!
//! All four produce the identical candidate set; they differ only in cost.
//!
//! # Modules
//!
//! - [`index`]: the index itself: build, search, persistence
//! - [`space`]: the distance-space abstraction
//! - [`pivot`]: pivot selection and pivot-distance oracles
//! - [`query`]: k-NN and range query objects
//! - [`comb`]: tuple-id encoding
//! - [`dataset`]: synthetic data and recall evaluation

pub mod comb;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod heap;
pub mod index;
pub mod permutation;
pub mod pivot;
pub mod pool;
pub mod postings;
pub mod query;
pub mod space;
pub mod stats;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{IndexParams, InvProcAlg, QueryParams};
pub use error::{Result, TupeloError};
pub use index::NappHorderIndex;
pub use pivot::{DirectPivotDistances, PivotDistanceOracle, PivotSet};
pub use query::{KnnQuery, Query, RangeQuery, SearchResult};
pub use space::{EuclideanSpace, Space};
pub use stats::SearchStats;
pub use types::{ObjectId, Permutation, PivotId, PostingId};
