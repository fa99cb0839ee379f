//! Parallel construction of the posting-list array.
//!
//! Work is partitioned over a dedicated rayon pool of `index_thread_qty`
//! workers. Each worker appends into its own scratch postings, keyed by the
//! stable worker index, and flushes into the shared lists under per-list
//! mutexes once its buffered document count reaches the flush threshold.
//! A final flush drains every scratch, then all lists are integer-sorted in
//! parallel and unwrapped out of their mutexes, so queries read them without
//! locks.

use crate::comb::gen_comb_ids;
use crate::config::IndexParams;
use crate::constants::build::{MAX_TMP_DOC_QTY, POSTING_RESERVE_HEADROOM};
use crate::error::{Result, TupeloError};
use crate::permutation::permutation_from_distances;
use crate::pivot::{PivotDistanceOracle, PivotSet};
use crate::pool::VectorPool;
use crate::postings::PostingList;
use crate::space::Space;
use crate::types::{ObjectId, PostingId};
use log::info;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::time::Instant;

/// Per-worker scratch postings plus the document counter that triggers a
/// flush.
struct ThreadScratch {
    lists: Vec<PostingList>,
    doc_qty: usize,
}

impl ThreadScratch {
    fn new(posting_qty: usize) -> Self {
        Self {
            lists: vec![Vec::new(); posting_qty],
            doc_qty: 0,
        }
    }
}

/// Append every nonempty scratch list to its shared counterpart and clear
/// the scratch. Each shared list is locked individually, so workers flushing
/// disjoint lists proceed in parallel.
fn flush_scratch(scratch: &mut ThreadScratch, shared: &[Mutex<PostingList>]) {
    for (posting_id, local) in scratch.lists.iter_mut().enumerate() {
        if !local.is_empty() {
            shared[posting_id].lock().extend_from_slice(local);
            local.clear();
        }
    }
    scratch.doc_qty = 0;
}

/// Build the full posting-list array for `data`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn build_posting_lists<S: Space>(
    space: &S,
    data: &[S::Point],
    pivots: &PivotSet<S::Point>,
    oracle: &dyn PivotDistanceOracle<S>,
    params: &IndexParams,
    posting_qty: usize,
    expected_avg_size: usize,
    comb_pool: &VectorPool<PostingId>,
) -> Result<Vec<PostingList>> {
    let thread_qty = params.index_thread_qty;
    let reserve = (expected_avg_size as f64 * POSTING_RESERVE_HEADROOM) as usize;

    let shared: Vec<Mutex<PostingList>> = (0..posting_qty)
        .map(|_| Mutex::new(Vec::with_capacity(reserve)))
        .collect();
    let scratch: Vec<Mutex<ThreadScratch>> = (0..thread_qty)
        .map(|_| Mutex::new(ThreadScratch::new(posting_qty)))
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(thread_qty)
        .build()
        .map_err(|e| TupeloError::invalid_parameter(format!("cannot start build pool: {}", e)))?;

    let started = Instant::now();

    pool.install(|| {
        (0..data.len()).into_par_iter().try_for_each(|id| -> Result<()> {
            let thread_id = rayon::current_thread_index().unwrap_or(0);
            assert!(thread_id < thread_qty, "worker thread id out of range");

            let mut dists = Vec::with_capacity(pivots.len());
            oracle.index_time_distances(space, pivots.points(), &data[id], &mut dists)?;
            let perm = permutation_from_distances(&dists);

            let mut comb_ids = comb_pool.loan();
            gen_comb_ids(
                &perm,
                params.num_prefix,
                params.pivot_comb_qty,
                params.skip_val,
                &mut comb_ids,
            );

            let mut scratch = scratch[thread_id].lock();
            for &comb_id in &comb_ids {
                assert!(
                    (comb_id as usize) < posting_qty,
                    "posting id {} out of range {}",
                    comb_id,
                    posting_qty
                );
                scratch.lists[comb_id as usize].push(id as ObjectId);
            }
            scratch.doc_qty += 1;
            if scratch.doc_qty >= MAX_TMP_DOC_QTY {
                flush_scratch(&mut scratch, &shared);
            }
            drop(scratch);

            comb_pool.release(comb_ids);
            Ok(())
        })
    })?;

    // Drain whatever the workers still buffer, then establish the one
    // post-build invariant: every list sorted ascending by object id.
    for slot in &scratch {
        flush_scratch(&mut slot.lock(), &shared);
    }
    pool.install(|| {
        shared.par_iter().for_each(|list| list.lock().sort_unstable());
    });

    info!(
        "built {} posting lists over {} objects in {:?} ({} threads)",
        posting_qty,
        data.len(),
        started.elapsed(),
        thread_qty
    );

    Ok(shared.into_iter().map(Mutex::into_inner).collect())
}
