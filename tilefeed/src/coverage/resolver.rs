//! Tile coverage for a viewport.

use crate::coord::{bbox_to_tile, BBox, Bounded, TileCoord};

/// The visible map area at one moment.
///
/// Built fresh for every load cycle and never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Current (fractional) map zoom.
    pub zoom: f64,
    /// Visible geographic bounds.
    pub bounds: BBox,
}

impl Viewport {
    pub fn new(zoom: f64, bounds: BBox) -> Self {
        Self { zoom, bounds }
    }
}

/// Whether a tile (or explicit rectangle) touches `bbox`.
///
/// Inclusive: shared edges count as overlap.
#[inline]
pub fn overlaps(item: &impl Bounded, bbox: &BBox) -> bool {
    item.bbox().intersects(bbox)
}

/// Computes the tiles at or above `min_zoom` that cover the viewport.
///
/// The primary tile is the smallest single tile containing the visible
/// bounds. If it is already at `min_zoom` or deeper it is returned alone,
/// even though it may extend well past the visible area. Otherwise it is
/// subdivided level by level until `min_zoom`, keeping only tiles that
/// overlap the viewport.
///
/// A tile that misses the viewport cannot have children that hit it, so
/// non-overlapping tiles are dropped at every level rather than only at the
/// end. The result is the same set in the same order.
pub fn resolve_coverage(viewport: &Viewport, min_zoom: u8) -> Vec<TileCoord> {
    let primary = bbox_to_tile(&viewport.bounds);
    if primary.zoom >= min_zoom {
        return vec![primary];
    }

    let mut candidates = vec![primary];
    let mut zoom = primary.zoom;
    while zoom < min_zoom {
        candidates = candidates
            .iter()
            .flat_map(TileCoord::children)
            .filter(|tile| overlaps(tile, &viewport.bounds))
            .collect();
        zoom += 1;
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::tile_to_bbox;
    use crate::coverage::merge_bounds;

    /// Shrink a box towards its center by `fraction` of its size on each side.
    fn inset(b: BBox, fraction: f64) -> BBox {
        BBox::new(
            b.min_x + b.width() * fraction,
            b.min_y + b.height() * fraction,
            b.max_x - b.width() * fraction,
            b.max_y - b.height() * fraction,
        )
    }

    #[test]
    fn test_viewport_inside_min_zoom_tile_yields_one_tile() {
        let tile = TileCoord::new(275, 167, 9);
        let bounds = inset(tile_to_bbox(&tile), 0.3);
        let viewport = Viewport::new(11.0, bounds);

        let coverage = resolve_coverage(&viewport, 9);

        assert_eq!(coverage.len(), 1);
        assert!(coverage[0].zoom >= 9);
        assert!(tile_to_bbox(&coverage[0]).contains(&bounds));
    }

    #[test]
    fn test_primary_tile_deeper_than_min_zoom_is_used_as_is() {
        let tile = TileCoord::new(4400, 2687, 13);
        let bounds = inset(tile_to_bbox(&tile), 0.1);
        let viewport = Viewport::new(14.0, bounds);

        let coverage = resolve_coverage(&viewport, 9);

        assert_eq!(coverage, vec![bbox_to_tile(&bounds)]);
        assert!(coverage[0].zoom >= 13);
    }

    #[test]
    fn test_subdivides_two_levels_to_min_zoom() {
        // A box spanning the center of a zoom-7 tile can only fit that tile
        let parent = TileCoord::new(68, 41, 7);
        let pb = tile_to_bbox(&parent);
        let bounds = inset(pb, 0.3);
        assert_eq!(bbox_to_tile(&bounds), parent);

        let viewport = Viewport::new(9.5, bounds);
        let coverage = resolve_coverage(&viewport, 9);

        assert!(!coverage.is_empty());
        assert!(coverage.iter().all(|t| t.zoom == 9));

        let union = merge_bounds(&coverage).unwrap();
        assert!(union.contains(&bounds));

        // Of the 16 grandchildren, the 30% inset misses the outer ring
        assert_eq!(coverage.len(), 4);
        for tile in &coverage {
            assert!(overlaps(tile, &bounds));
        }
    }

    #[test]
    fn test_subdivision_keeps_only_overlapping_tiles() {
        let parent = TileCoord::new(0, 0, 1);
        let pb = tile_to_bbox(&parent);
        // Upper-left quarter of the zoom-1 tile, slightly inset, but
        // crossing into the neighbour so the primary tile is the root
        let bounds = BBox::new(pb.min_x + 1.0, pb.max_y - 30.0, 10.0, pb.max_y - 1.0);
        let viewport = Viewport::new(3.0, bounds);

        let coverage = resolve_coverage(&viewport, 2);

        assert!(coverage.iter().all(|t| t.zoom == 2));
        assert!(coverage.iter().all(|t| overlaps(t, &bounds)));
        assert!(coverage.contains(&TileCoord::new(0, 0, 2)));
        assert!(coverage.contains(&TileCoord::new(2, 0, 2)));
        assert!(!coverage.contains(&TileCoord::new(0, 3, 2)));
    }

    #[test]
    fn test_overlaps_accepts_tile_or_rectangle() {
        let viewport = BBox::new(0.0, 0.0, 1.0, 1.0);
        let touching = BBox::new(1.0, 1.0, 2.0, 2.0);
        let apart = BBox::new(1.5, 1.5, 2.0, 2.0);

        assert!(overlaps(&touching, &viewport));
        assert!(!overlaps(&apart, &viewport));
        assert!(overlaps(&TileCoord::new(1, 0, 1), &viewport));
        // South-west quadrant meets the viewport only at (0, 0).
        assert!(overlaps(&TileCoord::new(0, 1, 1), &viewport));
        assert!(!overlaps(&TileCoord::new(0, 3, 2), &viewport));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_coverage_union_contains_viewport(
                lon in -170.0..170.0_f64,
                lat in -80.0..80.0_f64,
                w in 0.01..5.0_f64,
                h in 0.01..3.0_f64,
                min_zoom in 4u8..=9
            ) {
                let bounds = BBox::new(lon, lat, lon + w, lat + h);
                let viewport = Viewport::new(f64::from(min_zoom), bounds);
                let coverage = resolve_coverage(&viewport, min_zoom);

                prop_assert!(!coverage.is_empty());
                prop_assert!(coverage.iter().all(|t| t.zoom >= min_zoom));

                let union = merge_bounds(&coverage).unwrap();
                let eps = 1e-7;
                prop_assert!(union.min_x - eps <= bounds.min_x && bounds.max_x <= union.max_x + eps);
                prop_assert!(union.min_y - eps <= bounds.min_y && bounds.max_y <= union.max_y + eps);
            }
        }
    }
}
