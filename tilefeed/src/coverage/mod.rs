//! Viewport coverage.
//!
//! Turns the visible map area into the set of tiles that must be loaded,
//! and collapses a set of tiles into the single rectangle that is sent to
//! the feature source.
//!
//! # Example
//!
//! ```
//! use tilefeed::coord::BBox;
//! use tilefeed::coverage::{merge_bounds, resolve_coverage, Viewport};
//!
//! let viewport = Viewport::new(11.0, BBox::new(13.30, 52.45, 13.50, 52.55));
//! let tiles = resolve_coverage(&viewport, 9);
//! let query = merge_bounds(&tiles).expect("coverage is never empty");
//! assert!(tiles.iter().all(|t| t.zoom >= 9));
//! assert!(query.contains(&viewport.bounds));
//! ```

mod merge;
mod resolver;

pub use merge::merge_bounds;
pub use resolver::{overlaps, resolve_coverage, Viewport};
