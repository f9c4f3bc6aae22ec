//! Decoded tile payloads: per-layer feature buckets.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

/// A decoded feature with a projected hit-test point.
///
/// `x`/`y` are in projected world coordinates at the tile's zoom; the engine
/// only ever compares them against query points in the same space.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<u64>,
    pub source_layer: String,
    pub x: f64,
    pub y: f64,
    pub properties: HashMap<String, JsonValue>,
}

impl Feature {
    pub fn new(id: Option<u64>, source_layer: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id,
            source_layer: source_layer.into(),
            x,
            y,
            properties: HashMap::new(),
        }
    }
}

/// A tile's decoded, layer-specific drawable data, keyed to one style layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub layer_id: String,
    pub features: Vec<Feature>,
}

impl Bucket {
    pub fn new(layer_id: impl Into<String>) -> Self {
        Self { layer_id: layer_id.into(), features: Vec::new() }
    }

    pub fn with_features(layer_id: impl Into<String>, features: Vec<Feature>) -> Self {
        Self { layer_id: layer_id.into(), features }
    }
}

/// Payload a tile worker delivers when (re)decoding finishes.
///
/// `complete == false` marks a partial parse: some buckets could not be built
/// yet (typically glyphs still in flight) and the tile will be re-requested
/// once the missing resources arrive.
#[derive(Debug, Clone, Default)]
pub struct TileData {
    pub buckets: Vec<Bucket>,
    pub complete: bool,
}

impl TileData {
    pub fn complete(buckets: Vec<Bucket>) -> Self {
        Self { buckets, complete: true }
    }

    pub fn partial(buckets: Vec<Bucket>) -> Self {
        Self { buckets, complete: false }
    }
}
