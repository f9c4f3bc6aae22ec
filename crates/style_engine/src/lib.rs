//! Map style engine.
//!
//! Owns the sources, layers and classes of an applied style document and
//! drives the per-frame pipeline: `cascade` resolves class-driven property
//! targets and schedules transitions, `recalculate` evaluates zoom functions
//! and in-flight transitions into concrete values, `update` keeps each
//! source's tile set in step with the viewport, and `get_render_data`
//! composes the immutable snapshot a renderer consumes. Asynchronous
//! glyph/sprite/source/tile completions re-enter through the event entry
//! points and fan out via a single registered [`Observer`].

use std::collections::{HashMap, HashSet};
use std::ops::Add;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Error, Result, anyhow, bail};
use log::{debug, info, warn};
use style::{Color, LayerDesc, SourceDesc, StyleDocument, Value, Visibility};
use tile::{LonLatBounds, TileData, TileId};

mod aggregate;
mod paint;
mod query;
mod render;
mod source;
mod transition;
mod zoom_history;

pub use aggregate::{GlyphRange, Observer, ResourceAggregator};
pub use paint::EvaluatedPaint;
pub use query::{QueriedFeature, QueryParameters};
pub use render::{RenderData, RenderItem, RenderLayer};
pub use source::{Source, Tile, TileState};
pub use style::PropertyTransition;
pub use transition::{ActiveTransition, Easing};
pub use zoom_history::ZoomHistory;

/// Default per-source budget for retired (off-viewport) tiles.
pub const DEFAULT_TILE_CACHE_SIZE: usize = 64;

/// A wall-clock sample as an offset from an arbitrary epoch. The engine never
/// reads a clock itself; callers pass the frame time into every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimePoint(pub Duration);

impl TimePoint {
    pub const ZERO: TimePoint = TimePoint(Duration::ZERO);

    pub fn from_millis(ms: u64) -> Self {
        TimePoint(Duration::from_millis(ms))
    }

    pub fn saturating_since(self, earlier: TimePoint) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for TimePoint {
    type Output = TimePoint;

    fn add(self, rhs: Duration) -> TimePoint {
        TimePoint(self.0 + rhs)
    }
}

/// Frame rendering mode. Still-image rendering collapses every transition to
/// an instantaneous change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Continuous,
    Still,
}

/// Per-frame viewport parameters consumed by [`Style::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateParameters {
    pub zoom: f64,
    pub now: TimePoint,
    pub bounds: LonLatBounds,
}

/// The style engine. Mutations, the frame passes and the event entry points
/// all run on one execution context; only the composed [`RenderData`] leaves
/// it.
pub struct Style {
    sources: Vec<Source>,
    /// Draw order; position in this vector is the layer's draw position.
    layers: Vec<LayerDesc>,
    /// Cascade/transition state per layer id.
    paint_states: HashMap<String, paint::PaintState>,
    /// Active classes in activation order.
    classes: Vec<String>,
    transition_properties: Option<PropertyTransition>,
    easing: Easing,
    aggregator: ResourceAggregator,
    zoom_history: ZoomHistory,
    has_pending_transitions: bool,
    sprite_pending: bool,
    sprite_url: Option<String>,
    glyphs_url: Option<String>,
    tile_cache_size: usize,
    /// Snapshot of the last composition, kept for feature queries and
    /// low-memory pinning.
    last_render: Option<RenderData>,
    composition_stale: bool,
    /// Whether a style document has been applied.
    loaded: bool,
}

impl Style {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            layers: Vec::new(),
            paint_states: HashMap::new(),
            classes: Vec::new(),
            transition_properties: None,
            easing: Easing::default(),
            aggregator: ResourceAggregator::new(),
            zoom_history: ZoomHistory::new(),
            has_pending_transitions: false,
            sprite_pending: false,
            sprite_url: None,
            glyphs_url: None,
            tile_cache_size: DEFAULT_TILE_CACHE_SIZE,
            last_render: None,
            composition_stale: false,
            loaded: false,
        }
    }

    /// Replace the registered observer; only one is active at a time.
    pub fn set_observer(&mut self, observer: Box<dyn Observer>) {
        self.aggregator.set_observer(observer);
    }

    /// Replace the entire style with a parsed document. On failure the error
    /// is recorded (see [`Style::last_error`]), the rollup error fires, and
    /// the previous style state stays intact. Returns whether the document
    /// was applied.
    pub fn set_json(&mut self, data: &str, base: &str) -> bool {
        match style::parse_style(data, base) {
            Ok(doc) => {
                self.apply_document(doc);
                true
            }
            Err(error) => {
                warn!("Style: failed to apply style document: {error:#}");
                self.aggregator.document_error(error);
                false
            }
        }
    }

    fn apply_document(&mut self, doc: StyleDocument) {
        for source in &mut self.sources {
            source.cancel_pending();
        }
        self.sources = doc.sources.into_iter().map(Source::new).collect();
        self.layers = doc.layers;
        self.paint_states = self
            .layers
            .iter()
            .map(|layer| (layer.id.clone(), paint::PaintState::default()))
            .collect();
        self.classes.clear();
        self.transition_properties = doc.transition;
        self.sprite_pending = doc.sprite.is_some();
        self.sprite_url = doc.sprite;
        self.glyphs_url = doc.glyphs;
        self.last_render = None;
        self.composition_stale = false;
        self.loaded = true;
        info!(
            "Style: applied document ({} sources, {} layers)",
            self.sources.len(),
            self.layers.len()
        );
    }

    /// True once the document is applied, the sprite resolved, and every
    /// source is loaded with no outstanding tile requests.
    pub fn is_loaded(&self) -> bool {
        if !self.loaded || self.sprite_pending {
            return false;
        }
        self.sources.iter().all(Source::is_loaded)
    }

    pub fn last_error(&self) -> Option<Arc<Error>> {
        self.aggregator.last_error()
    }

    /// Whether any property transition is still in flight after the most
    /// recent cascade/recalculate.
    pub fn has_transitions(&self) -> bool {
        self.has_pending_transitions
    }

    /// One-shot flag: a partial tile may now be completable; the next
    /// [`Style::update`] consumes it and re-requests those tiles.
    pub fn should_reparse_partial_tiles(&self) -> bool {
        self.aggregator.should_reparse_partial_tiles()
    }

    /// Evaluated paint of one layer from the most recent recalculate.
    pub fn evaluated_paint(&self, layer_id: &str) -> Option<&EvaluatedPaint> {
        self.paint_states.get(layer_id).map(paint::PaintState::evaluated)
    }

    /// A placement pass or resource arrival invalidated the last snapshot;
    /// cleared by the next [`Style::get_render_data`].
    pub fn needs_recomposition(&self) -> bool {
        self.composition_stale
    }

    pub fn sprite_url(&self) -> Option<&str> {
        self.sprite_url.as_deref()
    }

    pub fn glyphs_url(&self) -> Option<&str> {
        self.glyphs_url.as_deref()
    }

    // ---- structural mutation ------------------------------------------

    pub fn add_source(&mut self, desc: SourceDesc) -> Result<()> {
        if self.sources.iter().any(|s| s.id() == desc.id) {
            bail!("duplicate source id \"{}\"", desc.id);
        }
        info!("Style: added source \"{}\"", desc.id);
        self.sources.push(Source::new(desc));
        Ok(())
    }

    pub fn get_source(&self, id: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.id() == id)
    }

    /// Remove a source, cancelling its outstanding tile requests. Late
    /// completions for it are dropped without observer dispatch.
    pub fn remove_source(&mut self, id: &str) -> Result<()> {
        let Some(index) = self.sources.iter().position(|s| s.id() == id) else {
            bail!("no source with id \"{id}\"");
        };
        let mut source = self.sources.remove(index);
        source.cancel_pending();
        info!("Style: removed source \"{id}\"");
        Ok(())
    }

    /// Insert a layer, before the layer named by `before` or appended at the
    /// top of the draw order. Fails without side effects on duplicate ids or
    /// an unknown anchor.
    pub fn add_layer(&mut self, layer: LayerDesc, before: Option<&str>) -> Result<()> {
        if self.get_layer(&layer.id).is_some() {
            bail!("duplicate layer id \"{}\"", layer.id);
        }
        let index = match before {
            Some(anchor) => self
                .layers
                .iter()
                .position(|l| l.id == anchor)
                .ok_or_else(|| anyhow!("no layer with id \"{anchor}\" to insert before"))?,
            None => self.layers.len(),
        };
        info!("Style: added layer \"{}\"", layer.id);
        self.paint_states.insert(layer.id.clone(), paint::PaintState::default());
        self.layers.insert(index, layer);
        Ok(())
    }

    pub fn remove_layer(&mut self, id: &str) -> Result<()> {
        let Some(index) = self.layers.iter().position(|l| l.id == id) else {
            bail!("no layer with id \"{id}\"");
        };
        self.layers.remove(index);
        self.paint_states.remove(id);
        info!("Style: removed layer \"{id}\"");
        Ok(())
    }

    pub fn get_layer(&self, id: &str) -> Option<&LayerDesc> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Layers in draw order.
    pub fn layers(&self) -> &[LayerDesc] {
        &self.layers
    }

    // ---- classes ------------------------------------------------------

    /// Activate a class. Returns false when it was already active. A given
    /// transition becomes the transition applied by the next cascade.
    pub fn add_class(&mut self, name: &str, transition: Option<PropertyTransition>) -> bool {
        if transition.is_some() {
            self.transition_properties = transition;
        }
        if self.has_class(name) {
            return false;
        }
        self.classes.push(name.to_string());
        true
    }

    pub fn remove_class(&mut self, name: &str, transition: Option<PropertyTransition>) -> bool {
        if transition.is_some() {
            self.transition_properties = transition;
        }
        let Some(index) = self.classes.iter().position(|c| c == name) else {
            return false;
        };
        self.classes.remove(index);
        true
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c == name)
    }

    /// Replace the active class set (duplicates dropped, order kept).
    /// Returns whether the set actually changed.
    pub fn set_classes(&mut self, classes: Vec<String>, transition: Option<PropertyTransition>) -> bool {
        if transition.is_some() {
            self.transition_properties = transition;
        }
        let mut deduped: Vec<String> = Vec::with_capacity(classes.len());
        for class in classes {
            if !deduped.contains(&class) {
                deduped.push(class);
            }
        }
        if deduped == self.classes {
            return false;
        }
        self.classes = deduped;
        true
    }

    /// Active classes in activation order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn set_transition_properties(&mut self, transition: Option<PropertyTransition>) {
        self.transition_properties = transition;
    }

    /// Interpolation curve for future transitions (default linear).
    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    // ---- per-frame passes ---------------------------------------------

    /// Resolve every layer's property targets from base paint plus active
    /// classes, installing transitions for targets that changed. Idempotent
    /// while classes and declarations are unchanged.
    pub fn cascade(&mut self, now: TimePoint, mode: RenderMode) {
        let transition = (mode == RenderMode::Continuous)
            .then_some(self.transition_properties)
            .flatten();
        let reference_zoom = self.zoom_history.zoom();
        for layer in &self.layers {
            let state = self.paint_states.entry(layer.id.clone()).or_default();
            state.cascade(layer, &self.classes, now, transition, self.easing, reference_zoom);
            if mode == RenderMode::Still {
                state.clear_transitions();
            }
        }
        self.has_pending_transitions = self
            .paint_states
            .values()
            .any(|state| state.has_active_transitions(now));
    }

    /// Evaluate every layer's rendered values at (`zoom`, `now`). Returns
    /// whether any value changed since the previous pass, which gates
    /// whether the renderer must re-issue draw commands absent new tiles.
    pub fn recalculate(&mut self, zoom: f64, now: TimePoint, mode: RenderMode) -> bool {
        let crossed = self.zoom_history.update(zoom, now);
        let transition = (mode == RenderMode::Continuous)
            .then_some(self.transition_properties)
            .flatten();
        let mut changed = false;
        for layer in &self.layers {
            let state = self.paint_states.entry(layer.id.clone()).or_default();
            changed |= state.recalculate(zoom, now, crossed, transition, self.easing);
        }
        self.has_pending_transitions = self
            .paint_states
            .values()
            .any(|state| state.has_active_transitions(now));
        tracing::debug!(zoom, crossed, changed, "recalculated style properties");
        changed
    }

    /// Bring every source's tile set in step with the viewport, re-requesting
    /// a full parse for partial tiles when one is pending.
    pub fn update(&mut self, params: &UpdateParameters) {
        let reparse = self.aggregator.take_reparse_flag();
        if reparse {
            debug!("Style: re-requesting full parse for partial tiles");
        }
        for source in &mut self.sources {
            source.update(&params.bounds, params.zoom, self.tile_cache_size, reparse);
        }
    }

    /// Compose the immutable per-frame snapshot: layers in draw order, one
    /// item per ready (layer, tile) pair, background layers without tiles.
    pub fn get_render_data(&mut self) -> RenderData {
        let zoom = self.zoom_history.zoom();
        let mut data = RenderData::default();
        let mut background_seen = false;
        for layer in &self.layers {
            if layer.visibility == Visibility::None {
                continue;
            }
            if let Some(z) = zoom {
                if !layer.covers_zoom(z) {
                    continue;
                }
            }
            let paint = self
                .paint_states
                .get(&layer.id)
                .map(|state| state.evaluated().clone())
                .unwrap_or_default();
            let render_layer = RenderLayer {
                id: layer.id.clone(),
                kind: layer.kind,
                source: layer.source.clone(),
                paint,
            };

            if layer.is_background() {
                if !background_seen {
                    background_seen = true;
                    let color = render_layer
                        .paint
                        .get("background-color")
                        .and_then(Value::as_color)
                        .unwrap_or(Color::BLACK);
                    let opacity = render_layer
                        .paint
                        .get("background-opacity")
                        .and_then(Value::as_number)
                        .unwrap_or(1.0);
                    data.background_color = color.with_opacity(opacity as f32);
                }
                data.order.push(RenderItem { tile: None, bucket: None, layer: render_layer });
                continue;
            }

            let Some(source_id) = &layer.source else {
                continue;
            };
            let Some(source) = self.sources.iter().find(|s| s.id() == source_id) else {
                debug!("Style: layer \"{}\" references removed source \"{source_id}\"", layer.id);
                continue;
            };
            data.sources.insert(source_id.clone());
            for tile in source.ready_tiles() {
                if let Some(bucket) = tile.buckets.get(&layer.id) {
                    data.order.push(RenderItem {
                        tile: Some(tile.id),
                        bucket: Some(Arc::clone(bucket)),
                        layer: render_layer.clone(),
                    });
                }
            }
        }
        self.composition_stale = false;
        self.last_render = Some(data.clone());
        data
    }

    /// Hit-test the last composed snapshot in reverse draw order (topmost
    /// layer first) within [`Style::get_query_radius`] tolerance.
    pub fn query_rendered_features(&self, params: &QueryParameters) -> Vec<QueriedFeature> {
        match &self.last_render {
            Some(render) => query::query_rendered_features(render, params, self.get_query_radius()),
            None => Vec::new(),
        }
    }

    /// Hit-test tolerance derived from the widest evaluated stroke/radius.
    pub fn get_query_radius(&self) -> f64 {
        let mut radius = 0.0f64;
        for state in self.paint_states.values() {
            for (name, value) in state.evaluated() {
                let Some(v) = value.as_number() else {
                    continue;
                };
                if name.ends_with("-width") {
                    radius = radius.max(v / 2.0);
                } else if name.ends_with("-radius") {
                    radius = radius.max(v);
                }
            }
        }
        radius
    }

    pub fn set_source_tile_cache_size(&mut self, size: usize) {
        self.tile_cache_size = size;
    }

    /// Shed cached off-viewport tile data from every source. Tiles referenced
    /// by the last composed snapshot stay resident.
    pub fn on_low_memory(&mut self) {
        let mut pinned: HashMap<String, HashSet<TileId>> = HashMap::new();
        if let Some(render) = &self.last_render {
            for item in &render.order {
                if let (Some(source), Some(tile)) = (&item.layer.source, item.tile) {
                    pinned.entry(source.clone()).or_default().insert(tile);
                }
            }
        }
        let empty = HashSet::new();
        for source in &mut self.sources {
            let keep = pinned.get(source.id()).unwrap_or(&empty);
            source.on_low_memory(keep);
        }
    }

    pub fn dump_debug_logs(&self) {
        info!(
            "Style: loaded={}, {} layers, classes [{}]",
            self.is_loaded(),
            self.layers.len(),
            self.classes.join(", ")
        );
        for source in &self.sources {
            info!(
                "  source \"{}\": loaded={}, {} tiles cached, {} pending",
                source.id(),
                source.is_loaded(),
                source.tile_count(),
                source.pending_tiles().len()
            );
        }
    }

    // ---- event entry points -------------------------------------------
    //
    // Completions from the glyph/sprite/source/tile subsystems re-enter here
    // on the style's execution context. Ids are validated against the
    // current arenas; events for removed entities are dropped without
    // observer dispatch.

    pub fn source_loaded(&mut self, source_id: &str) {
        let Some(source) = self.sources.iter_mut().find(|s| s.id() == source_id) else {
            debug!("Style: ignoring load event for unknown source \"{source_id}\"");
            return;
        };
        source.mark_loaded();
        self.aggregator.source_loaded(source_id);
    }

    pub fn source_error(&mut self, source_id: &str, error: Error) {
        if !self.sources.iter().any(|s| s.id() == source_id) {
            debug!("Style: ignoring error event for unknown source \"{source_id}\"");
            return;
        }
        warn!("Style: source \"{source_id}\" failed: {error:#}");
        self.aggregator.source_error(source_id, error);
    }

    pub fn tile_loaded(&mut self, source_id: &str, tile: TileId, data: TileData) {
        let Some(source) = self.sources.iter_mut().find(|s| s.id() == source_id) else {
            debug!("Style: ignoring tile {tile} for unknown source \"{source_id}\"");
            return;
        };
        let Some(is_new) = source.ingest(tile, data) else {
            debug!("Style: ignoring stale tile {tile} for source \"{source_id}\"");
            return;
        };
        self.aggregator.tile_loaded(source_id, tile, is_new);
    }

    pub fn tile_error(&mut self, source_id: &str, tile: TileId, error: Error) {
        let Some(source) = self.sources.iter_mut().find(|s| s.id() == source_id) else {
            debug!("Style: ignoring tile error for unknown source \"{source_id}\"");
            return;
        };
        if !source.ingest_error(tile) {
            return;
        }
        warn!("Style: tile {tile} of source \"{source_id}\" failed: {error:#}");
        self.aggregator.tile_error(source_id, tile, error);
    }

    pub fn glyphs_loaded(&mut self, font_stack: &str, range: GlyphRange) {
        self.aggregator.glyphs_loaded(font_stack, range);
    }

    pub fn glyphs_error(&mut self, font_stack: &str, range: GlyphRange, error: Error) {
        warn!("Style: glyph range {range:?} of \"{font_stack}\" failed: {error:#}");
        self.aggregator.glyphs_error(font_stack, range, error);
    }

    pub fn sprite_loaded(&mut self) {
        self.sprite_pending = false;
        self.aggregator.sprite_loaded();
    }

    pub fn sprite_error(&mut self, error: Error) {
        // Terminal: the style stops waiting for the sprite.
        self.sprite_pending = false;
        warn!("Style: sprite failed: {error:#}");
        self.aggregator.sprite_error(error);
    }

    pub fn placement_redone(&mut self) {
        self.composition_stale = true;
        self.aggregator.placement_redone();
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::new()
    }
}
