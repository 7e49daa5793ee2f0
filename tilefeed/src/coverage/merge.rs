//! Bounding box merging.

use crate::coord::{BBox, Bounded};

/// Smallest rectangle enclosing every item's bounding box.
///
/// Returns `None` for an empty slice. One query over the merged box
/// replaces one query per tile; features inside the box but outside every
/// tile are over-fetched.
pub fn merge_bounds<T: Bounded>(items: &[T]) -> Option<BBox> {
    items
        .iter()
        .map(Bounded::bbox)
        .reduce(|merged, b| merged.union(&b))
}
