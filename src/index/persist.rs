//! Textual index persistence.
//!
//! The layout is whitespace-delimited and self-checking: `key=value` header
//! lines, the pivot-position line for sampled pivot sets, `postQty`, one
//! space-separated line per posting list, and a closing `lineQty` whose
//! value must equal the total number of lines in the file. Loading verifies
//! the header against the supplied dataset and rejects any mismatch: an
//! index is only valid against the exact dataset it was built from.

use crate::comb::posting_space;
use crate::config::IndexParams;
use crate::error::{Result, TupeloError};
use crate::pivot::{DirectPivotDistances, PivotDistanceOracle, PivotSet};
use crate::postings::PostingList;
use crate::space::Space;
use crate::types::ObjectId;
use log::info;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::{NappHorderIndex, METHOD_NAME};

impl<S: Space> NappHorderIndex<S> {
    /// Save the index to `path`.
    ///
    /// Only structure derived from the dataset is written (parameters,
    /// pivot positions, posting lists), never the points themselves.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut out = BufWriter::new(file);
        let mut line_qty = 0usize;

        write_field(&mut out, "methodDesc", METHOD_NAME, &mut line_qty)?;
        write_field(&mut out, "numPivot", self.params.num_pivot, &mut line_qty)?;
        write_field(&mut out, "numPivotIndex", self.params.num_prefix, &mut line_qty)?;
        write_field(&mut out, "skipVal", self.params.skip_val, &mut line_qty)?;
        write_field(&mut out, "pivotCombQty", self.params.pivot_comb_qty, &mut line_qty)?;
        write_field(&mut out, "indexQty", self.posting_lists.len(), &mut line_qty)?;
        write_field(
            &mut out,
            "pivotFile",
            self.params
                .pivot_file
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            &mut line_qty,
        )?;
        write_field(
            &mut out,
            "disablePivotIndex",
            self.params.disable_pivot_index as u8,
            &mut line_qty,
        )?;
        write_field(&mut out, "hashTrickDim", self.params.hash_trick_dim, &mut line_qty)?;
        write_field(&mut out, "dataQty", self.data.len(), &mut line_qty)?;

        if let Some(positions) = self.pivots.positions() {
            write_ids(&mut out, positions, &mut line_qty)?;
        }

        write_field(&mut out, "postQty", self.posting_lists.len(), &mut line_qty)?;
        for list in &self.posting_lists {
            write_ids(&mut out, list, &mut line_qty)?;
        }

        // The closing count includes its own line.
        write_field(&mut out, "lineQty", line_qty + 1, &mut line_qty)?;
        out.flush()?;

        info!(
            "saved index ({} lines) to {}",
            line_qty,
            path.as_ref().display()
        );
        Ok(())
    }

    /// Load an index saved by [`save`](Self::save), re-binding it to `data`.
    ///
    /// The dataset must be the one the index was built from: size and pivot
    /// positions are verified and any inconsistency fails the load.
    pub fn load(space: S, data: Vec<S::Point>, path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_oracle(space, data, path, Box::new(DirectPivotDistances))
    }

    /// [`load`](Self::load) with a caller-supplied pivot-distance oracle.
    pub fn load_with_oracle(
        space: S,
        data: Vec<S::Point>,
        path: impl AsRef<Path>,
        oracle: Box<dyn PivotDistanceOracle<S>>,
    ) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut lines = BufReader::new(file).lines();
        let mut line_qty = 0usize;

        let method: String = read_field(&mut lines, "methodDesc", &mut line_qty)?;
        if method != METHOD_NAME {
            return Err(TupeloError::data_mismatch(format!(
                "index was created by a different method: {}",
                method
            )));
        }

        let num_pivot: usize = read_field(&mut lines, "numPivot", &mut line_qty)?;
        let num_prefix: usize = read_field(&mut lines, "numPivotIndex", &mut line_qty)?;
        let skip_val: usize = read_field(&mut lines, "skipVal", &mut line_qty)?;
        let pivot_comb_qty: usize = read_field(&mut lines, "pivotCombQty", &mut line_qty)?;
        let index_qty: usize = read_field(&mut lines, "indexQty", &mut line_qty)?;
        let pivot_file: String = read_field(&mut lines, "pivotFile", &mut line_qty)?;
        let disable_pivot_index: u8 = read_field(&mut lines, "disablePivotIndex", &mut line_qty)?;
        let hash_trick_dim: usize = read_field(&mut lines, "hashTrickDim", &mut line_qty)?;
        let data_qty: usize = read_field(&mut lines, "dataQty", &mut line_qty)?;

        if data_qty != data.len() {
            return Err(TupeloError::data_mismatch(format!(
                "index was built over {} objects but the dataset holds {}",
                data_qty,
                data.len()
            )));
        }

        let params = IndexParams {
            num_pivot,
            num_prefix,
            pivot_comb_qty,
            skip_val,
            disable_pivot_index: disable_pivot_index != 0,
            hash_trick_dim,
            pivot_file: (!pivot_file.is_empty()).then(|| PathBuf::from(&pivot_file)),
            ..Default::default()
        };
        params.validate()?;

        let oracle: Box<dyn PivotDistanceOracle<S>> = if params.disable_pivot_index {
            Box::new(DirectPivotDistances)
        } else {
            oracle
        };

        let pivots = match &params.pivot_file {
            Some(file) => PivotSet::load(&space, file, num_pivot)?,
            None => {
                let positions = read_ids(&mut lines, "pivot positions", &mut line_qty)?;
                if positions.len() != num_pivot {
                    return Err(TupeloError::data_mismatch(format!(
                        "pivot position line holds {} entries, header says {}",
                        positions.len(),
                        num_pivot
                    )));
                }
                PivotSet::from_positions(&data, positions)?
            }
        };

        let post_qty: usize = read_field(&mut lines, "postQty", &mut line_qty)?;
        let expected_qty = posting_space(num_pivot, pivot_comb_qty, skip_val) as usize;
        if post_qty != index_qty || post_qty != expected_qty {
            return Err(TupeloError::data_mismatch(format!(
                "posting count {} does not match header ({}) or configuration ({})",
                post_qty, index_qty, expected_qty
            )));
        }

        let mut posting_lists: Vec<PostingList> = Vec::with_capacity(post_qty);
        for posting_id in 0..post_qty {
            let list = read_ids(&mut lines, "posting list", &mut line_qty)?;
            if !list.is_sorted() {
                return Err(TupeloError::data_mismatch(format!(
                    "posting list {} is not sorted",
                    posting_id
                )));
            }
            posting_lists.push(list);
        }

        let expected_lines: usize = read_field(&mut lines, "lineQty", &mut line_qty)?;
        if expected_lines != line_qty {
            return Err(TupeloError::data_mismatch(format!(
                "file declares {} lines but {} were read",
                expected_lines, line_qty
            )));
        }

        info!(
            "loaded index ({} posting lists) from {}",
            post_qty,
            path.as_ref().display()
        );

        let (exp_avg_post_size, exp_post_per_query) =
            super::expected_sizes(&params, data.len(), post_qty);
        let comb_pool = super::comb_pool(&params);
        Ok(Self::assemble(
            space,
            data,
            params,
            pivots,
            oracle,
            posting_lists,
            comb_pool,
            exp_avg_post_size,
            exp_post_per_query,
        ))
    }
}

fn write_field<W: Write>(
    out: &mut W,
    name: &str,
    value: impl Display,
    line_qty: &mut usize,
) -> Result<()> {
    writeln!(out, "{}={}", name, value)?;
    *line_qty += 1;
    Ok(())
}

fn write_ids<W: Write>(out: &mut W, ids: &[ObjectId], line_qty: &mut usize) -> Result<()> {
    let mut first = true;
    for id in ids {
        if first {
            write!(out, "{}", id)?;
            first = false;
        } else {
            write!(out, " {}", id)?;
        }
    }
    writeln!(out)?;
    *line_qty += 1;
    Ok(())
}

fn next_line<B: BufRead>(lines: &mut Lines<B>, what: &str, line_qty: &mut usize) -> Result<String> {
    let line = lines
        .next()
        .ok_or_else(|| {
            TupeloError::invalid_format(format!("unexpected end of file reading {}", what))
        })??;
    *line_qty += 1;
    Ok(line)
}

fn read_field<T: FromStr, B: BufRead>(
    lines: &mut Lines<B>,
    name: &str,
    line_qty: &mut usize,
) -> Result<T> {
    let line = next_line(lines, name, line_qty)?;
    let (key, value) = line.split_once('=').ok_or_else(|| {
        TupeloError::invalid_format(format!("expected {}=<value>, got '{}'", name, line))
    })?;
    if key != name {
        return Err(TupeloError::invalid_format(format!(
            "expected field {}, found {}",
            name, key
        )));
    }
    value.parse::<T>().map_err(|_| {
        TupeloError::invalid_format(format!("cannot parse value '{}' for field {}", value, name))
    })
}

fn read_ids<B: BufRead>(
    lines: &mut Lines<B>,
    what: &str,
    line_qty: &mut usize,
) -> Result<Vec<ObjectId>> {
    let line = next_line(lines, what, line_qty)?;
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<ObjectId>().map_err(|_| {
                TupeloError::invalid_format(format!("cannot parse id '{}' in {}", tok, what))
            })
        })
        .collect()
}
