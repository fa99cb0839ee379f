//! Named constants for configuration values.
//!
//! This module centralizes magic numbers and default values used throughout
//! the codebase, making them easier to find, document, and tune.

/// Constants for the parallel build pipeline.
pub mod build {
    /// Per-thread document count that triggers a scratch-postings flush.
    /// Bounds thread-local memory to roughly this many posting entries
    /// times the tuple fan-out.
    pub const MAX_TMP_DOC_QTY: usize = 4096 * 32;

    /// Headroom factor applied when reserving posting-list capacity from
    /// the expected average size.
    pub const POSTING_RESERVE_HEADROOM: f64 = 1.2;
}

/// Default values for build-time parameters.
pub mod defaults {
    /// Default number of pivots (`numPivot`).
    pub const NUM_PIVOT: usize = 512;

    /// Default permutation prefix length indexed per object (`numPrefix`).
    pub const NUM_PREFIX: usize = 32;

    /// Default tuple cardinality (`pivotCombQty`): pairs.
    pub const PIVOT_COMB_QTY: usize = 2;

    /// Default skip-filter stride (`skipVal`): keep every raw tuple index.
    pub const SKIP_VAL: usize = 1;

    /// Default overlap threshold before combinatorial scaling (`minTimes`).
    pub const MIN_TIMES: usize = 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_threshold() {
        assert_eq!(build::MAX_TMP_DOC_QTY, 131_072);
    }

    #[test]
    fn test_defaults_consistent() {
        assert!(defaults::NUM_PREFIX <= defaults::NUM_PIVOT);
        assert!(defaults::SKIP_VAL >= 1);
        assert!((1..=3).contains(&defaults::PIVOT_COMB_QTY));
    }
}
