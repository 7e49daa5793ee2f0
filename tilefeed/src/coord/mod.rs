//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (longitude/latitude),
//! Web Mercator tile addresses and tile bounding boxes.

mod types;

pub use types::{
    BBox, Bounded, CoordError, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Zoom level used for the fixed-point tile index in `bbox_to_tile`.
const PRECISION_ZOOM: u8 = 32;

/// Fractional tile position of a point at `zoom`.
///
/// Latitude is clamped to the Web Mercator range first, so the poles map
/// to the top and bottom tile rows.
fn point_to_tile_fraction(lon: f64, lat: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);
    let sin = lat.clamp(MIN_LAT, MAX_LAT).to_radians().sin();

    let x = n * (lon / 360.0 + 0.5);
    let y = n * (0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI);

    (x, y)
}

/// Floor a fractional tile index into `[0, 2^zoom - 1]`.
fn tile_index(value: f64, zoom: u8) -> u32 {
    let max = (1u64 << zoom) - 1;
    (value.floor().max(0.0) as u64).min(max) as u32
}

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `lat` - Latitude in degrees (-90.0 to 90.0, clamped to the Mercator range)
/// * `zoom` - Zoom level (0 to 28)
#[inline]
pub fn point_to_tile(lon: f64, lat: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let (x, y) = point_to_tile_fraction(lon, lat, zoom);
    Ok(TileCoord::new(
        tile_index(x, zoom),
        tile_index(y, zoom),
        zoom,
    ))
}

/// Returns the smallest single tile that fully contains `bbox`.
///
/// Both corners are projected to 32-bit tile indices; the result is the
/// deepest zoom at which they still share a common ancestor, capped at
/// [`MAX_ZOOM`]. The box is clamped to the world extent first.
pub fn bbox_to_tile(bbox: &BBox) -> TileCoord {
    let bbox = bbox.clamp_to_world();

    let (min_fx, min_fy) = point_to_tile_fraction(bbox.min_x, bbox.min_y, PRECISION_ZOOM);
    let (max_fx, max_fy) = point_to_tile_fraction(bbox.max_x, bbox.max_y, PRECISION_ZOOM);

    let min_x = tile_index(min_fx, PRECISION_ZOOM);
    let min_y = tile_index(min_fy, PRECISION_ZOOM);
    let max_x = tile_index(max_fx, PRECISION_ZOOM);
    let max_y = tile_index(max_fy, PRECISION_ZOOM);

    let zoom = common_zoom(min_x, min_y, max_x, max_y);
    if zoom == 0 {
        return TileCoord::new(0, 0, 0);
    }

    let shift = (PRECISION_ZOOM - zoom) as u32;
    TileCoord::new(min_x >> shift, min_y >> shift, zoom)
}

/// Deepest zoom at which two 32-bit tile indices share all leading bits.
fn common_zoom(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> u8 {
    for zoom in 0..MAX_ZOOM {
        let mask = 1u32 << (PRECISION_ZOOM - zoom - 1);
        if (min_x & mask) != (max_x & mask) || (min_y & mask) != (max_y & mask) {
            return zoom;
        }
    }
    MAX_ZOOM
}

/// Longitude of a tile column's western edge.
#[inline]
fn tile_x_to_lon(x: u32, zoom: u8) -> f64 {
    x as f64 / 2.0_f64.powi(zoom as i32) * 360.0 - 180.0
}

/// Latitude of a tile row's northern edge (inverse Web Mercator).
#[inline]
fn tile_y_to_lat(y: u32, zoom: u8) -> f64 {
    let n = PI - 2.0 * PI * y as f64 / 2.0_f64.powi(zoom as i32);
    n.sinh().atan().to_degrees()
}

/// Geographic bounding box of a tile.
pub fn tile_to_bbox(tile: &TileCoord) -> BBox {
    BBox::new(
        tile_x_to_lon(tile.x, tile.zoom),
        tile_y_to_lat(tile.y + 1, tile.zoom),
        tile_x_to_lon(tile.x + 1, tile.zoom),
        tile_y_to_lat(tile.y, tile.zoom),
    )
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the (longitude, latitude) of the tile's center.
#[inline]
pub fn tile_center(tile: &TileCoord) -> (f64, f64) {
    let b = tile_to_bbox(tile);
    ((b.min_x + b.max_x) / 2.0, (b.min_y + b.max_y) / 2.0)
}
