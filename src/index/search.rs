//! Query-time candidate generation and the four posting-list algorithms.
//!
//! Every algorithm implements the same contract: given the query's tuple
//! ids, produce the objects whose accumulated overlap (in units of
//! `skip_val` per matched posting entry) reaches the scaled threshold. The
//! candidate set is identical across algorithms; only the traversal
//! strategy, and therefore the memory/latency profile, differs.

use crate::comb::gen_comb_ids;
use crate::config::InvProcAlg;
use crate::error::Result;
use crate::heap::TopKeyHeap;
use crate::permutation::permutation_from_distances;
use crate::postings::{post_list_union, IdCount};
use crate::query::{KnnQuery, Query, RangeQuery, SearchResult};
use crate::space::Space;
use crate::stats::SearchStats;
use crate::types::{ObjectId, PostingId};
use std::time::Instant;

use super::NappHorderIndex;

impl<S: Space> NappHorderIndex<S> {
    /// Find the `k` nearest neighbors of `point`.
    pub fn search_knn(&self, point: &S::Point, k: usize) -> Result<Vec<SearchResult>> {
        let mut query = KnnQuery::new(self.space(), point, k);
        self.search(&mut query)?;
        Ok(query.into_results())
    }

    /// Find every object within `radius` of `point`.
    pub fn search_range(&self, point: &S::Point, radius: f32) -> Result<Vec<SearchResult>> {
        let mut query = RangeQuery::new(self.space(), point, radius);
        self.search(&mut query)?;
        Ok(query.into_results())
    }

    /// Run a search, delivering surviving candidates to the query object's
    /// `check_and_add` (unless `skip_checking` is set).
    pub fn search<Q: Query<S>>(&self, query: &mut Q) -> Result<()> {
        let search_started = Instant::now();
        let mut local = SearchStats {
            proc_query_qty: 1,
            ..Default::default()
        };

        let mut cands = self.cand_pool.loan();
        self.collect_candidates(query.point(), &mut local, &mut cands)?;

        let check_started = Instant::now();
        if !self.query_params.skip_checking {
            for &id in &cands {
                query.check_and_add(id, &self.data[id as usize]);
            }
        }
        local.dist_comp_time = check_started.elapsed();
        local.search_time = search_started.elapsed();

        self.stats.lock().absorb(&local);
        self.cand_pool.release(cands);
        Ok(())
    }

    /// Candidate ids for `point` under the current query-time parameters,
    /// without the final distance check. Diagnostic entry point; the
    /// returned order is algorithm-dependent and not a contract.
    pub fn candidates(&self, point: &S::Point) -> Result<Vec<ObjectId>> {
        let search_started = Instant::now();
        let mut local = SearchStats {
            proc_query_qty: 1,
            ..Default::default()
        };

        let mut cands = self.cand_pool.loan();
        self.collect_candidates(point, &mut local, &mut cands)?;
        local.search_time = search_started.elapsed();
        self.stats.lock().absorb(&local);

        let out = cands.clone();
        self.cand_pool.release(cands);
        Ok(out)
    }

    /// Steps 1–3 of every search: permutation, tuple ids, accumulation.
    fn collect_candidates(
        &self,
        point: &S::Point,
        stats: &mut SearchStats,
        cands: &mut Vec<ObjectId>,
    ) -> Result<()> {
        let started = Instant::now();
        let mut dists = Vec::with_capacity(self.pivots.len());
        self.oracle
            .query_time_distances(&self.space, self.pivots.points(), point, &mut dists)?;
        let perm = permutation_from_distances(&dists);
        stats.dist_pivot_comp_time = started.elapsed();

        let started = Instant::now();
        let mut comb_ids = self.comb_pool.loan();
        gen_comb_ids(
            &perm,
            self.num_prefix_search(),
            self.params.pivot_comb_qty,
            self.params.skip_val,
            &mut comb_ids,
        );
        stats.ids_gen_time = started.elapsed();

        match self.query_params.inv_proc_alg {
            InvProcAlg::Scan => self.run_scan(&comb_ids, cands, stats),
            InvProcAlg::StoreSort => self.run_store_sort(&comb_ids, cands, stats),
            InvProcAlg::Merge => self.run_merge(&comb_ids, cands, stats),
            InvProcAlg::PriorityQueue => self.run_priority_queue(&comb_ids, cands, stats),
        }

        self.comb_pool.release(comb_ids);
        Ok(())
    }

    /// Counter array over all N objects. O(N) memory; strongest when lists
    /// are short and numerous.
    fn run_scan(&self, comb_ids: &[PostingId], cands: &mut Vec<ObjectId>, stats: &mut SearchStats) {
        let thresh = self.scaled_threshold();
        let weight = self.params.skip_val as u32;

        let mut counter = self.counter_pool.loan();
        counter.resize(self.data.len(), 0);

        for &comb_id in comb_ids {
            let post = &self.posting_lists[comb_id as usize];
            stats.post_qty += post.len() as u64;
            for &obj in post {
                counter[obj as usize] += weight;
            }
        }

        for (id, &count) in counter.iter().enumerate() {
            if count as u64 >= thresh {
                cands.push(id as ObjectId);
            }
        }
        self.counter_pool.release(counter);
    }

    /// Concatenate all touched lists, integer-sort, emit ids whose run is
    /// long enough. Memory proportional to postings touched.
    fn run_store_sort(
        &self,
        comb_ids: &[PostingId],
        cands: &mut Vec<ObjectId>,
        stats: &mut SearchStats,
    ) {
        let thresh = self.scaled_threshold();
        let weight = self.params.skip_val as u64;

        let mut tmp = self.tmp_res_pool.loan();

        let started = Instant::now();
        for &comb_id in comb_ids {
            let post = &self.posting_lists[comb_id as usize];
            stats.post_qty += post.len() as u64;
            tmp.extend_from_slice(post);
        }
        stats.copy_post_time = started.elapsed();

        let started = Instant::now();
        tmp.sort_unstable();
        stats.sort_comp_time = started.elapsed();

        let started = Instant::now();
        let mut start = 0;
        while start < tmp.len() {
            let id = tmp[start];
            let mut next = start + 1;
            while next < tmp.len() && tmp[next] == id {
                next += 1;
            }
            if weight * (next - start) as u64 >= thresh {
                cands.push(id);
            }
            start = next;
        }
        stats.scan_sorted_time = started.elapsed();

        self.tmp_res_pool.release(tmp);
    }

    /// Pairwise sorted-union merge into alternating id/count buffers.
    /// Memory proportional to candidate breadth.
    fn run_merge(
        &self,
        comb_ids: &[PostingId],
        cands: &mut Vec<ObjectId>,
        stats: &mut SearchStats,
    ) {
        let thresh = self.scaled_threshold();
        let weight = self.params.skip_val as u32;

        let mut current: Vec<IdCount> = Vec::new();
        let mut next: Vec<IdCount> = Vec::new();

        for &comb_id in comb_ids {
            let post = &self.posting_lists[comb_id as usize];
            stats.post_qty += post.len() as u64;
            post_list_union(&current, post, &mut next, weight);
            std::mem::swap(&mut current, &mut next);
        }

        for entry in &current {
            if entry.qty as u64 >= thresh {
                cands.push(entry.id);
            }
        }
    }

    /// Document-at-a-time traversal: a replace-top heap of posting cursors
    /// keyed by negated object id, so the smallest id surfaces first.
    fn run_priority_queue(
        &self,
        comb_ids: &[PostingId],
        cands: &mut Vec<ObjectId>,
        stats: &mut SearchStats,
    ) {
        let thresh = self.scaled_threshold();
        let weight = self.params.skip_val as u64;

        let mut heap: TopKeyHeap<i64, u32> = TopKeyHeap::with_capacity(comb_ids.len());
        // Cursor state per nonempty query posting list.
        let mut cursors: Vec<(&[ObjectId], usize)> = Vec::with_capacity(comb_ids.len());

        for &comb_id in comb_ids {
            let post = self.posting_lists[comb_id as usize].as_slice();
            if !post.is_empty() {
                let state_idx = cursors.len() as u32;
                cursors.push((post, 0));
                heap.push(-(post[0] as i64), state_idx);
                stats.post_qty += 1;
            }
        }

        let mut accum: u64 = 0;
        while !heap.is_empty() {
            let min_doc_neg = heap.top_key();

            // Accumulate every list currently positioned on this document.
            while !heap.is_empty() && heap.top_key() == min_doc_neg {
                let state_idx = heap.top_data() as usize;
                let (post, pos) = &mut cursors[state_idx];
                accum += weight;
                *pos += 1;
                stats.post_qty += 1;
                if *pos < post.len() {
                    heap.replace_top_key(-(post[*pos] as i64));
                } else {
                    heap.pop();
                }
            }

            if accum >= thresh {
                cands.push((-min_doc_neg) as ObjectId);
            }
            accum = 0;
        }
    }

    /// The effective overlap threshold.
    ///
    /// `min_times` is scaled by the number of tuples a single shared pivot
    /// participates in at the *build* prefix, so the parameter keeps its
    /// "approximate number of shared pivots" meaning across c.
    fn scaled_threshold(&self) -> u64 {
        let m = self.query_params.min_times as u64;
        let l = self.params.num_prefix as u64;
        match self.params.pivot_comb_qty {
            1 => m,
            2 => m * l.saturating_sub(1) / 2,
            3 => m * l.saturating_sub(1) * l.saturating_sub(2) / 6,
            _ => unreachable!("pivot_comb_qty validated to 1..=3"),
        }
    }
}
