//! Requested-tile tracking.
//!
//! Records which tiles have already been sent to the feature source so a
//! tile is requested at most once over a loader's lifetime. The set only
//! grows; [`RequestTracker::clear`] is the single explicit way to forget
//! tiles (e.g. to retry after a failed fetch).

use std::collections::HashSet;

use crate::coord::TileCoord;

/// Presence set of requested tiles, keyed by quadkey.
#[derive(Debug, Default, Clone)]
pub struct RequestTracker {
    requested: HashSet<String>,
}

impl RequestTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only tiles not requested before, marking each kept tile.
    ///
    /// Input order is preserved. A tile appearing twice in `tiles` is
    /// returned once.
    pub fn filter_new<I>(&mut self, tiles: I) -> Vec<TileCoord>
    where
        I: IntoIterator<Item = TileCoord>,
    {
        tiles
            .into_iter()
            .filter(|tile| self.requested.insert(tile.quadkey()))
            .collect()
    }

    /// Whether a tile has been requested.
    pub fn is_requested(&self, tile: &TileCoord) -> bool {
        self.requested.contains(&tile.quadkey())
    }

    /// Number of distinct tiles requested.
    pub fn len(&self) -> usize {
        self.requested.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requested.is_empty()
    }

    /// Forget every requested tile. Returns how many were forgotten.
    pub fn clear(&mut self) -> usize {
        let count = self.requested.len();
        self.requested.clear();
        count
    }
}
