//! Tile and bounding box value types.

use std::fmt;

use thiserror::Error;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.051_128_779_806_59;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -MAX_LAT;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// Minimum zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Deepest zoom level a tile can be addressed at.
///
/// Matches the depth at which `bbox_to_tile` stops narrowing.
pub const MAX_ZOOM: u8 = 28;

/// Errors from coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("Invalid zoom level: {0} (must be between 0 and 28)")]
    InvalidZoom(u8),

    #[error("Invalid quadkey: {0:?}")]
    InvalidQuadkey(String),
}

/// A Web Mercator tile identified by column, row and zoom.
///
/// `x` grows eastward from the antimeridian, `y` grows southward from the
/// northern edge of the projection. Equality is by all three fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Column (0 = west)
    pub x: u32,
    /// Row (0 = north)
    pub y: u32,
    /// Zoom level
    pub zoom: u8,
}

impl TileCoord {
    /// Create a new tile coordinate.
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// The four tiles one zoom level deeper that partition this tile.
    ///
    /// Order is north-west, north-east, south-east, south-west.
    pub fn children(&self) -> [TileCoord; 4] {
        let (x, y, zoom) = (self.x * 2, self.y * 2, self.zoom + 1);
        [
            TileCoord::new(x, y, zoom),
            TileCoord::new(x + 1, y, zoom),
            TileCoord::new(x + 1, y + 1, zoom),
            TileCoord::new(x, y + 1, zoom),
        ]
    }

    /// The tile one zoom level up containing this one, or `None` at zoom 0.
    pub fn parent(&self) -> Option<TileCoord> {
        if self.zoom == 0 {
            return None;
        }
        Some(TileCoord::new(self.x >> 1, self.y >> 1, self.zoom - 1))
    }

    /// Quadrant key encoding the path from the root tile to this one.
    ///
    /// One digit per zoom level; the root tile has an empty key.
    pub fn quadkey(&self) -> String {
        let mut key = String::with_capacity(self.zoom as usize);
        for z in (1..=self.zoom).rev() {
            let mask = 1u32 << (z - 1);
            let mut digit = b'0';
            if self.x & mask != 0 {
                digit += 1;
            }
            if self.y & mask != 0 {
                digit += 2;
            }
            key.push(digit as char);
        }
        key
    }

    /// Parse a quadrant key back into a tile.
    pub fn from_quadkey(key: &str) -> Result<TileCoord, CoordError> {
        if key.len() > MAX_ZOOM as usize {
            return Err(CoordError::InvalidQuadkey(key.to_string()));
        }

        let zoom = key.len() as u8;
        let (mut x, mut y) = (0u32, 0u32);
        for (i, digit) in key.bytes().enumerate() {
            let mask = 1u32 << (zoom as usize - i - 1);
            match digit {
                b'0' => {}
                b'1' => x |= mask,
                b'2' => y |= mask,
                b'3' => {
                    x |= mask;
                    y |= mask;
                }
                _ => return Err(CoordError::InvalidQuadkey(key.to_string())),
            }
        }

        Ok(TileCoord::new(x, y, zoom))
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Axis-aligned geographic rectangle in degrees.
///
/// `min_x`/`max_x` are longitudes, `min_y`/`max_y` latitudes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    /// Create a new bounding box.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create a zero-area box at a single point.
    pub fn from_point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    /// Grow this box to include a point.
    pub fn expand(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Smallest box enclosing both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Separating-axis test. Touching edges count as intersecting.
    pub fn intersects(&self, other: &BBox) -> bool {
        !(self.max_x < other.min_x
            || self.min_x > other.max_x
            || self.max_y < other.min_y
            || self.min_y > other.max_y)
    }

    /// Whether `other` lies entirely within this box (edges inclusive).
    pub fn contains(&self, other: &BBox) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Clamp to the Web Mercator world extent.
    pub fn clamp_to_world(&self) -> BBox {
        BBox::new(
            self.min_x.clamp(MIN_LON, MAX_LON),
            self.min_y.clamp(MIN_LAT, MAX_LAT),
            self.max_x.clamp(MIN_LON, MAX_LON),
            self.max_y.clamp(MIN_LAT, MAX_LAT),
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// `[min_x, min_y, max_x, max_y]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

impl From<[f64; 4]> for BBox {
    fn from(b: [f64; 4]) -> Self {
        BBox::new(b[0], b[1], b[2], b[3])
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6}, {:.6}, {:.6}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Anything with a geographic footprint.
///
/// Lets intersection and merging accept a tile address or an explicit
/// rectangle interchangeably.
pub trait Bounded {
    fn bbox(&self) -> BBox;
}

impl Bounded for TileCoord {
    fn bbox(&self) -> BBox {
        super::tile_to_bbox(self)
    }
}

impl Bounded for BBox {
    fn bbox(&self) -> BBox {
        *self
    }
}

impl<T: Bounded + ?Sized> Bounded for &T {
    fn bbox(&self) -> BBox {
        (**self).bbox()
    }
}
