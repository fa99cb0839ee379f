//! Core identifier types.
//!
//! Identifiers are plain `u32` aliases rather than newtypes: posting lists
//! are bulk-copied and integer-sorted on the hot path, and object ids double
//! as dataset positions throughout.

/// Identifier of an object: its position in the indexed dataset.
pub type ObjectId = u32;

/// Identifier of a pivot: its position in the pivot set `[0, num_pivot)`.
pub type PivotId = u32;

/// Identifier of a posting list: a skip-filtered tuple rank in `[0, M)`.
pub type PostingId = u32;

/// A permutation of pivot ids, ordered by ascending distance to some object.
pub type Permutation = Vec<PivotId>;
