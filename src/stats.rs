//! Aggregate search statistics.
//!
//! Every query accumulates its timing breakdown locally, then folds it into
//! the index-wide totals under a single mutex at query end. The snapshot is
//! diagnostic output only, never part of a search result.

use serde::Serialize;
use std::time::Duration;

/// Cumulative statistics across all queries processed by one index.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SearchStats {
    /// Number of queries processed.
    pub proc_query_qty: u64,
    /// Total posting-list entries touched.
    pub post_qty: u64,
    /// End-to-end search time.
    pub search_time: Duration,
    /// Time computing query-to-pivot distances.
    pub dist_pivot_comp_time: Duration,
    /// Time enumerating query tuple ids.
    pub ids_gen_time: Duration,
    /// Time copying posting lists (StoreSort only).
    pub copy_post_time: Duration,
    /// Time integer-sorting the copied postings (StoreSort only).
    pub sort_comp_time: Duration,
    /// Time scanning the sorted postings for runs (StoreSort only).
    pub scan_sorted_time: Duration,
    /// Time in the final distance check.
    pub dist_comp_time: Duration,
}

impl SearchStats {
    /// Fold one query's measurements into the totals.
    pub(crate) fn absorb(&mut self, one: &SearchStats) {
        self.proc_query_qty += one.proc_query_qty;
        self.post_qty += one.post_qty;
        self.search_time += one.search_time;
        self.dist_pivot_comp_time += one.dist_pivot_comp_time;
        self.ids_gen_time += one.ids_gen_time;
        self.copy_post_time += one.copy_post_time;
        self.sort_comp_time += one.sort_comp_time;
        self.scan_sorted_time += one.scan_sorted_time;
        self.dist_comp_time += one.dist_comp_time;
    }

    /// Mean posting entries touched per query.
    pub fn postings_per_query(&self) -> f64 {
        if self.proc_query_qty == 0 {
            return 0.0;
        }
        self.post_qty as f64 / self.proc_query_qty as f64
    }

    /// Human-readable summary of per-query averages.
    pub fn summary(&self) -> String {
        let q = self.proc_query_qty.max(1) as u32;
        format!(
            "SearchStats:\n  \
             Queries: {} (postings/query: {:.1})\n  \
             Search time/query: {:?}\n  \
             Pivot-dist time/query: {:?}\n  \
             Ids-gen time/query: {:?}\n  \
             Copy/sort/scan time/query: {:?}/{:?}/{:?}\n  \
             Distance-check time/query: {:?}",
            self.proc_query_qty,
            self.postings_per_query(),
            self.search_time / q,
            self.dist_pivot_comp_time / q,
            self.ids_gen_time / q,
            self.copy_post_time / q,
            self.sort_comp_time / q,
            self.scan_sorted_time / q,
            self.dist_comp_time / q,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_accumulates() {
        let mut total = SearchStats::default();
        let one = SearchStats {
            proc_query_qty: 1,
            post_qty: 40,
            search_time: Duration::from_micros(100),
            ..Default::default()
        };
        total.absorb(&one);
        total.absorb(&one);
        assert_eq!(total.proc_query_qty, 2);
        assert_eq!(total.post_qty, 80);
        assert_eq!(total.search_time, Duration::from_micros(200));
        assert!((total.postings_per_query() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_handles_zero_queries() {
        let stats = SearchStats::default();
        assert!(stats.summary().contains("Queries: 0"));
    }
}
