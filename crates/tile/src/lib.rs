//! Tile-space data model: tile ids, viewport coverage math, and the decoded
//! per-layer feature buckets a tile worker delivers.

pub mod bucket;
pub mod id;

pub use bucket::{Bucket, Feature, TileData};
pub use id::{LonLatBounds, TileId, tile_cover};
