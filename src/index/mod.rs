//! The higher-order NAPP index.
//!
//! Rather than indexing each object under its k closest pivots individually,
//! the index enumerates unordered tuples (pairs or triples) of pivots drawn
//! from the top of the object's pivot ranking, and posts the object under
//! every tuple id. A query computes the same tuple set and keeps the objects
//! that share at least a (combinatorially scaled) threshold of tuples.
//!
//! The posting-list array is built once, in parallel, and is read-only and
//! lock-free afterwards; only the aggregate statistics mutate at query time,
//! under their own mutex.

mod build;
mod persist;
mod search;

use crate::comb::{posting_space, tuple_count};
use crate::config::{IndexParams, QueryParams};
use crate::error::{Result, TupeloError};
use crate::pivot::{DirectPivotDistances, PivotDistanceOracle, PivotSet};
use crate::pool::VectorPool;
use crate::postings::PostingList;
use crate::space::Space;
use crate::stats::SearchStats;
use crate::types::{ObjectId, PostingId};
use log::info;
use parking_lot::Mutex;

/// Method name recorded in saved index headers.
pub const METHOD_NAME: &str = "napp_horder";

/// A batch-built inverted index over higher-order pivot neighborhoods.
///
/// Generic over the [`Space`] supplying the distance function; the index
/// owns the space, the dataset, and the pivots. See the crate docs for the
/// overall data flow.
pub struct NappHorderIndex<S: Space> {
    space: S,
    data: Vec<S::Point>,
    params: IndexParams,
    query_params: QueryParams,
    pivots: PivotSet<S::Point>,
    oracle: Box<dyn PivotDistanceOracle<S>>,
    posting_lists: Vec<PostingList>,
    comb_pool: VectorPool<PostingId>,
    cand_pool: VectorPool<ObjectId>,
    tmp_res_pool: VectorPool<ObjectId>,
    counter_pool: VectorPool<u32>,
    stats: Mutex<SearchStats>,
    exp_avg_post_size: usize,
    exp_post_per_query: usize,
}

impl<S: Space> std::fmt::Debug for NappHorderIndex<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NappHorderIndex")
            .field("num_objects", &self.data.len())
            .field("num_postings", &self.posting_lists.len())
            .finish()
    }
}

impl<S: Space> NappHorderIndex<S> {
    /// Build an index over `data` with the direct-distance pivot oracle.
    pub fn build(space: S, data: Vec<S::Point>, params: IndexParams) -> Result<Self> {
        Self::build_with_oracle(space, data, params, Box::new(DirectPivotDistances))
    }

    /// Build an index with a caller-supplied pivot-distance oracle.
    ///
    /// `disable_pivot_index` forces the direct fallback regardless of the
    /// oracle passed here.
    pub fn build_with_oracle(
        space: S,
        data: Vec<S::Point>,
        params: IndexParams,
        oracle: Box<dyn PivotDistanceOracle<S>>,
    ) -> Result<Self> {
        params.validate()?;

        let oracle: Box<dyn PivotDistanceOracle<S>> = if params.disable_pivot_index {
            Box::new(DirectPivotDistances)
        } else {
            oracle
        };

        let pivots = match &params.pivot_file {
            Some(path) => PivotSet::load(&space, path, params.num_pivot)?,
            None => PivotSet::sample(&data, params.num_pivot, params.pivot_seed)?,
        };

        info!("indexing threads        = {}", params.index_thread_qty);
        info!(
            "pivot file              = {}",
            params
                .pivot_file
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        );
        info!("pivots                  = {}", params.num_pivot);
        info!("pivots to index (prefix)= {}", params.num_prefix);
        info!("hash trick dim          = {}", params.hash_trick_dim);
        info!("pivots per combination  = {}", params.pivot_comb_qty);
        info!("skip val                = {}", params.skip_val);

        let m = posting_space(params.num_pivot, params.pivot_comb_qty, params.skip_val) as usize;
        let (exp_avg_post_size, exp_post_per_query) = expected_sizes(&params, data.len(), m);

        let comb_pool = comb_pool(&params);
        let posting_lists = build::build_posting_lists(
            &space,
            &data,
            &pivots,
            oracle.as_ref(),
            &params,
            m,
            exp_avg_post_size,
            &comb_pool,
        )?;

        let index = Self::assemble(
            space,
            data,
            params,
            pivots,
            oracle,
            posting_lists,
            comb_pool,
            exp_avg_post_size,
            exp_post_per_query,
        );

        if index.params.print_pivot_stat {
            index.log_pivot_stat();
        }
        Ok(index)
    }

    /// Shared tail of `build` and `load`: pools and final assembly.
    #[allow(clippy::too_many_arguments)]
    fn assemble(
        space: S,
        data: Vec<S::Point>,
        params: IndexParams,
        pivots: PivotSet<S::Point>,
        oracle: Box<dyn PivotDistanceOracle<S>>,
        posting_lists: Vec<PostingList>,
        comb_pool: VectorPool<PostingId>,
        exp_avg_post_size: usize,
        exp_post_per_query: usize,
    ) -> Self {
        let t = params.index_thread_qty;
        let n = data.len();
        Self {
            cand_pool: VectorPool::new(t, 2 * exp_post_per_query),
            tmp_res_pool: VectorPool::new(t, 2 * exp_post_per_query),
            counter_pool: VectorPool::new(t, n),
            comb_pool,
            space,
            data,
            params,
            query_params: QueryParams::default(),
            pivots,
            oracle,
            posting_lists,
            stats: Mutex::new(SearchStats::default()),
            exp_avg_post_size,
            exp_post_per_query,
        }
    }

    /// Install query-time parameters. Idempotent; validates against the
    /// build configuration and reports the first failing precondition.
    pub fn set_query_time_params(&mut self, query_params: QueryParams) -> Result<()> {
        let prefix = query_params
            .num_prefix_search
            .unwrap_or(self.params.num_prefix);
        if prefix > self.params.num_pivot {
            return Err(TupeloError::invalid_parameter(format!(
                "numPrefixSearch ({}) must be <= numPivot ({})",
                prefix, self.params.num_pivot
            )));
        }

        info!("pivot overlap (minTimes)      = {}", query_params.min_times);
        info!("pivots to query (prefixSearch)= {}", prefix);
        info!("invProcAlg                    = {}", query_params.inv_proc_alg);
        info!("skipChecking                  = {}", query_params.skip_checking);

        self.query_params = query_params;
        Ok(())
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the index holds no objects.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The indexed dataset, positionally addressed by object id.
    pub fn data(&self) -> &[S::Point] {
        &self.data
    }

    /// The distance space.
    pub fn space(&self) -> &S {
        &self.space
    }

    /// Build-time configuration.
    pub fn params(&self) -> &IndexParams {
        &self.params
    }

    /// Currently installed query-time configuration.
    pub fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    /// The pivot set.
    pub fn pivots(&self) -> &PivotSet<S::Point> {
        &self.pivots
    }

    /// Number of posting lists, `M`.
    pub fn num_posting_lists(&self) -> usize {
        self.posting_lists.len()
    }

    /// One posting list, sorted ascending by object id.
    pub fn posting_list(&self, id: PostingId) -> Option<&[ObjectId]> {
        self.posting_lists.get(id as usize).map(Vec::as_slice)
    }

    /// Snapshot of the cumulative search statistics.
    pub fn search_stats(&self) -> SearchStats {
        self.stats.lock().clone()
    }

    /// Expected average posting-list length used for capacity planning.
    pub fn expected_avg_post_size(&self) -> usize {
        self.exp_avg_post_size
    }

    /// Expected posting entries touched per query (at the build prefix).
    pub fn expected_postings_per_query(&self) -> usize {
        self.exp_post_per_query
    }

    pub(crate) fn num_prefix_search(&self) -> usize {
        self.query_params
            .num_prefix_search
            .unwrap_or(self.params.num_prefix)
    }

    fn log_pivot_stat(&self) {
        let qty = self.posting_lists.len();
        let total: u64 = self.posting_lists.iter().map(|p| p.len() as u64).sum();
        let mean = total as f64 / qty.max(1) as f64;
        let var = self
            .posting_lists
            .iter()
            .map(|p| {
                let d = p.len() as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / qty.max(1) as f64;

        info!("========================");
        info!(
            "posting occupancy: mean {:.2} std {:.2} over {} lists",
            mean,
            var.sqrt(),
            qty
        );
        info!("expected mean posting size: {}", self.exp_avg_post_size);
        info!(
            "expected postings per query: {} (at the build prefix)",
            self.exp_post_per_query
        );
        if !self.data.is_empty() {
            info!("postings per document: {}", total / self.data.len() as u64);
        }
        info!("========================");
    }
}

/// Expected posting sizes from the configuration: the average list length
/// `N * C(L, c) / (s * M)` and the postings touched by one query at the
/// build prefix.
fn expected_sizes(params: &IndexParams, data_qty: usize, m: usize) -> (usize, usize) {
    let tuples = tuple_count(params.num_prefix, params.pivot_comb_qty) as f64;
    let s = params.skip_val as f64;
    let avg = (data_qty as f64 * tuples / (s * m.max(1) as f64)).ceil() as usize;
    let avg = avg.max(1);
    let per_query = (avg as f64 * tuples / s).ceil() as usize;
    (avg, per_query.max(1))
}

/// The tuple-id output pool: one buffer per worker, preallocated to the
/// worst-case output size `C(L, c)`.
fn comb_pool(params: &IndexParams) -> VectorPool<PostingId> {
    let worst = tuple_count(params.num_prefix, params.pivot_comb_qty) as usize;
    VectorPool::new(params.index_thread_qty, worst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_sizes_pairs() {
        let params = IndexParams {
            num_pivot: 16,
            num_prefix: 4,
            pivot_comb_qty: 2,
            skip_val: 1,
            ..Default::default()
        };
        // M = C(16,2) = 120, tuples per object = C(4,2) = 6.
        let (avg, per_query) = expected_sizes(&params, 1000, 120);
        assert_eq!(avg, 50);
        assert_eq!(per_query, 300);
    }

    #[test]
    fn test_expected_sizes_never_zero() {
        let params = IndexParams {
            num_pivot: 16,
            num_prefix: 4,
            ..Default::default()
        };
        let (avg, per_query) = expected_sizes(&params, 0, 120);
        assert!(avg >= 1);
        assert!(per_query >= 1);
    }
}
