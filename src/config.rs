//! Build-time and query-time configuration.
//!
//! Parameters arrive either as typed structs (`IndexParams::default()` plus
//! field assignment) or as string maps through `from_params`, which mirrors
//! the strict external interface: unknown names are rejected, synonymous
//! names may not both be given, and the first failing precondition is
//! reported.

use crate::comb::posting_space;
use crate::constants::defaults;
use crate::error::{Result, TupeloError};
use crate::types::PostingId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A string parameter map that tracks which keys were consumed.
///
/// `check_unused` turns every leftover key into an `UnknownParameter` error,
/// so callers cannot silently misspell a parameter.
pub struct ParamMap {
    entries: HashMap<String, String>,
    used: HashSet<String>,
}

impl ParamMap {
    /// Build a map from `(name, value)` pairs.
    pub fn new<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            used: HashSet::new(),
        }
    }

    /// True if the map holds `name`, consumed or not.
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Consume `name` and parse its value, or return `None` when absent.
    pub fn take<T: FromStr>(&mut self, name: &str) -> Result<Option<T>> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(raw) => {
                self.used.insert(name.to_string());
                raw.parse::<T>().map(Some).map_err(|_| {
                    TupeloError::invalid_parameter(format!(
                        "cannot parse value '{}' for parameter {}",
                        raw, name
                    ))
                })
            }
        }
    }

    /// Consume a boolean given as `true`/`false` or `1`/`0`.
    pub fn take_bool(&mut self, name: &str) -> Result<Option<bool>> {
        match self.entries.get(name).map(String::as_str) {
            None => Ok(None),
            Some(raw) => {
                self.used.insert(name.to_string());
                match raw {
                    "1" | "true" => Ok(Some(true)),
                    "0" | "false" => Ok(Some(false)),
                    other => Err(TupeloError::invalid_parameter(format!(
                        "cannot parse value '{}' for boolean parameter {}",
                        other, name
                    ))),
                }
            }
        }
    }

    /// Fail if any provided parameter was never consumed.
    pub fn check_unused(&self) -> Result<()> {
        for name in self.entries.keys() {
            if !self.used.contains(name) {
                return Err(TupeloError::UnknownParameter(name.clone()));
            }
        }
        Ok(())
    }
}

/// Build-time configuration, immutable once the index is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexParams {
    /// Number of pivots, `P`.
    pub num_pivot: usize,
    /// Permutation prefix length indexed per object, `L <= P`.
    pub num_prefix: usize,
    /// Tuple cardinality `c`: 1 (singletons), 2 (pairs), or 3 (triples).
    pub pivot_comb_qty: usize,
    /// Skip-filter stride `s >= 1`.
    pub skip_val: usize,
    /// Worker threads for the build; defaults to hardware concurrency.
    pub index_thread_qty: usize,
    /// Force the direct-distance fallback even when an accelerated
    /// pivot-distance oracle was supplied.
    pub disable_pivot_index: bool,
    /// Hash-trick dimensionality forwarded to the pivot-distance oracle;
    /// the index itself never reads it.
    pub hash_trick_dim: usize,
    /// When set, pivots are loaded from this file through
    /// `Space::read_dataset` instead of being sampled from the dataset.
    pub pivot_file: Option<PathBuf>,
    /// Log posting-list occupancy statistics after the build.
    pub print_pivot_stat: bool,
    /// Seed for pivot sampling; unset means seeded from entropy.
    pub pivot_seed: Option<u64>,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            num_pivot: defaults::NUM_PIVOT,
            num_prefix: defaults::NUM_PREFIX,
            pivot_comb_qty: defaults::PIVOT_COMB_QTY,
            skip_val: defaults::SKIP_VAL,
            index_thread_qty: std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1),
            disable_pivot_index: false,
            hash_trick_dim: 0,
            pivot_file: None,
            print_pivot_stat: false,
            pivot_seed: None,
        }
    }
}

impl IndexParams {
    /// Parse from a string parameter map. Recognized names: `numPivot`,
    /// `numPrefix` (synonym `numPivotIndex`), `pivotCombQty`, `skipVal`,
    /// `indexThreadQty`, `disablePivotIndex`, `hashTrickDim`, `pivotFile`,
    /// `printPivotStat`, `pivotSeed`.
    pub fn from_params<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut pm = ParamMap::new(params);
        let mut out = Self::default();

        if pm.has("numPrefix") && pm.has("numPivotIndex") {
            return Err(TupeloError::ConflictingParameters {
                first: "numPrefix",
                second: "numPivotIndex",
            });
        }

        if let Some(v) = pm.take("numPivot")? {
            out.num_pivot = v;
        }
        if let Some(v) = pm.take("numPivotIndex")? {
            out.num_prefix = v;
        }
        if let Some(v) = pm.take("numPrefix")? {
            out.num_prefix = v;
        }
        if let Some(v) = pm.take("pivotCombQty")? {
            out.pivot_comb_qty = v;
        }
        if let Some(v) = pm.take("skipVal")? {
            out.skip_val = v;
        }
        if let Some(v) = pm.take("indexThreadQty")? {
            out.index_thread_qty = v;
        }
        if let Some(v) = pm.take_bool("disablePivotIndex")? {
            out.disable_pivot_index = v;
        }
        if let Some(v) = pm.take("hashTrickDim")? {
            out.hash_trick_dim = v;
        }
        if let Some(v) = pm.take::<String>("pivotFile")? {
            if !v.is_empty() {
                out.pivot_file = Some(PathBuf::from(v));
            }
        }
        if let Some(v) = pm.take_bool("printPivotStat")? {
            out.print_pivot_stat = v;
        }
        if let Some(v) = pm.take("pivotSeed")? {
            out.pivot_seed = Some(v);
        }

        pm.check_unused()?;
        out.validate()?;
        Ok(out)
    }

    /// Check every build-time precondition, reporting the first failure.
    pub fn validate(&self) -> Result<()> {
        if self.num_pivot == 0 {
            return Err(TupeloError::invalid_parameter("numPivot must be > 0"));
        }
        if self.num_prefix == 0 {
            return Err(TupeloError::invalid_parameter("numPrefix must be > 0"));
        }
        if self.num_prefix > self.num_pivot {
            return Err(TupeloError::invalid_parameter(format!(
                "numPrefix ({}) must be <= numPivot ({})",
                self.num_prefix, self.num_pivot
            )));
        }
        if !(1..=3).contains(&self.pivot_comb_qty) {
            return Err(TupeloError::invalid_parameter(format!(
                "pivotCombQty ({}) must be 1, 2, or 3",
                self.pivot_comb_qty
            )));
        }
        if self.skip_val == 0 {
            return Err(TupeloError::invalid_parameter("skipVal must be >= 1"));
        }
        if self.index_thread_qty == 0 {
            return Err(TupeloError::invalid_parameter("indexThreadQty must be >= 1"));
        }
        let space = posting_space(self.num_pivot, self.pivot_comb_qty, self.skip_val);
        if space > PostingId::MAX as u64 + 1 {
            return Err(TupeloError::invalid_parameter(format!(
                "posting-id space of {} entries overflows 32-bit posting ids; \
                 lower numPivot or raise skipVal",
                space
            )));
        }
        Ok(())
    }
}

/// Posting-list intersection algorithm used at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvProcAlg {
    /// Counter array over all N objects.
    Scan,
    /// Concatenate touched postings, integer-sort, scan equal runs.
    StoreSort,
    /// Pairwise sorted-union merge of id/count lists.
    Merge,
    /// Document-at-a-time traversal over a replace-top heap.
    PriorityQueue,
}

impl fmt::Display for InvProcAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvProcAlg::Scan => "scan",
            InvProcAlg::StoreSort => "store-sort",
            InvProcAlg::Merge => "merge",
            InvProcAlg::PriorityQueue => "priority-queue",
        };
        f.write_str(name)
    }
}

impl FromStr for InvProcAlg {
    type Err = TupeloError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scan" => Ok(InvProcAlg::Scan),
            "store-sort" => Ok(InvProcAlg::StoreSort),
            "merge" => Ok(InvProcAlg::Merge),
            "priority-queue" | "pqueue" => Ok(InvProcAlg::PriorityQueue),
            other => Err(TupeloError::invalid_parameter(format!(
                "unknown inverted-file processing algorithm '{}'",
                other
            ))),
        }
    }
}

/// Query-time configuration; may be replaced between searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParams {
    /// Permutation prefix length used for the query, `L_q <= P`.
    /// Unset means "use the build prefix".
    pub num_prefix_search: Option<usize>,
    /// Overlap threshold before combinatorial scaling, `m`.
    pub min_times: usize,
    /// Posting-list intersection algorithm.
    pub inv_proc_alg: InvProcAlg,
    /// Skip the final distance check; candidates are then discarded
    /// unobserved, which is only useful for measuring candidate generation.
    pub skip_checking: bool,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            num_prefix_search: None,
            min_times: defaults::MIN_TIMES,
            inv_proc_alg: InvProcAlg::StoreSort,
            skip_checking: false,
        }
    }
}

impl QueryParams {
    /// Parse from a string parameter map. Recognized names:
    /// `numPrefixSearch`, `minTimes` (synonym `numPivotSearch`),
    /// `invProcAlg`, `skipChecking`.
    pub fn from_params<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut pm = ParamMap::new(params);
        let mut out = Self::default();

        if pm.has("minTimes") && pm.has("numPivotSearch") {
            return Err(TupeloError::ConflictingParameters {
                first: "minTimes",
                second: "numPivotSearch",
            });
        }

        if let Some(v) = pm.take("numPrefixSearch")? {
            out.num_prefix_search = Some(v);
        }
        if let Some(v) = pm.take("minTimes")? {
            out.min_times = v;
        }
        if let Some(v) = pm.take("numPivotSearch")? {
            out.min_times = v;
        }
        if let Some(v) = pm.take::<InvProcAlg>("invProcAlg")? {
            out.inv_proc_alg = v;
        }
        if let Some(v) = pm.take_bool("skipChecking")? {
            out.skip_checking = v;
        }

        pm.check_unused()?;
        Ok(out)
    }
}
