//! Tile ids and slippy-map coverage math (Web Mercator).

use std::f64::consts::PI;
use std::fmt;

/// Maximum latitude representable in Web Mercator.
const MAX_MERCATOR_LATITUDE: f64 = 85.051129;

/// Identifies a tile in the quadtree pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub const fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tile rows/columns at this zoom.
    pub fn dimension(&self) -> u32 {
        1u32 << self.z.min(31)
    }

    pub fn is_valid(&self) -> bool {
        self.z <= 31 && self.x < self.dimension() && self.y < self.dimension()
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Geographic bounds in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLatBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl LonLatBounds {
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self { west, south, east, north }
    }

    /// The whole world, clamped to the Mercator latitude range.
    pub const WORLD: LonLatBounds = LonLatBounds {
        west: -180.0,
        south: -MAX_MERCATOR_LATITUDE,
        east: 180.0,
        north: MAX_MERCATOR_LATITUDE,
    };
}

/// Fractional tile column of a longitude at `z`.
fn lon_to_tile_x(lon: f64, z: u8) -> f64 {
    (lon + 180.0) / 360.0 * (1u32 << z) as f64
}

/// Fractional tile row of a latitude at `z`.
fn lat_to_tile_y(lat: f64, z: u8) -> f64 {
    let lat = lat.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE).to_radians();
    (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * (1u32 << z) as f64
}

/// Tiles covering `bounds` at integer zoom `z`, in row-major order.
pub fn tile_cover(bounds: &LonLatBounds, z: u8) -> Vec<TileId> {
    let z = z.min(31);
    let max = (1u32 << z) - 1;
    let clamp = |v: f64| (v.floor().max(0.0) as u32).min(max);

    let x0 = clamp(lon_to_tile_x(bounds.west.min(bounds.east), z));
    let x1 = clamp(lon_to_tile_x(bounds.west.max(bounds.east), z));
    // North latitude maps to the smaller row index.
    let y0 = clamp(lat_to_tile_y(bounds.north.max(bounds.south), z));
    let y1 = clamp(lat_to_tile_y(bounds.north.min(bounds.south), z));

    let mut cover = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)) as usize);
    for y in y0..=y1 {
        for x in x0..=x1 {
            cover.push(TileId::new(z, x, y));
        }
    }
    cover
}
