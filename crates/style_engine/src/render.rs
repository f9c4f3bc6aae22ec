//! Immutable per-frame render snapshot.

use std::collections::BTreeSet;
use std::sync::Arc;

use style::{Color, LayerKind};
use tile::{Bucket, TileId};

use crate::paint::EvaluatedPaint;

/// Value copy of a layer as the renderer needs it: identity plus the paint
/// values evaluated by the most recent recalculate.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderLayer {
    pub id: String,
    pub kind: LayerKind,
    pub source: Option<String>,
    pub paint: EvaluatedPaint,
}

/// One drawable unit. Background layers carry no tile or bucket; tile-bound
/// layers reference the tile and its decoded bucket.
#[derive(Debug, Clone)]
pub struct RenderItem {
    pub tile: Option<TileId>,
    pub bucket: Option<Arc<Bucket>>,
    pub layer: RenderLayer,
}

/// Snapshot handed to the renderer, built once per frame. `order` preserves
/// the style's layer draw order exactly; nothing here aliases live engine
/// state, so the renderer may hold it across mutations.
#[derive(Debug, Clone, Default)]
pub struct RenderData {
    pub background_color: Color,
    /// Ids of every source referenced by a visible layer, even when none of
    /// its tiles is ready yet.
    pub sources: BTreeSet<String>,
    pub order: Vec<RenderItem>,
}
