//! Observer fan-in: granular subsystem events plus additive rollups.

use std::sync::Arc;

use anyhow::Error;
use tile::TileId;

/// Inclusive glyph codepoint range within one font stack.
pub type GlyphRange = (u32, u32);

/// Downstream consumer of style resource events.
///
/// In addition to the individual glyph, sprite, source and tile events, the
/// `on_resource_*` rollups fire for convenience. They are strictly additive:
/// when a source loads, both `on_source_loaded` and `on_resource_loaded` are
/// called. Every method defaults to a no-op so implementors override only
/// what they watch.
pub trait Observer {
    fn on_glyphs_loaded(&mut self, _font_stack: &str, _range: GlyphRange) {}
    fn on_glyphs_error(&mut self, _font_stack: &str, _range: GlyphRange, _error: &Error) {}
    fn on_sprite_loaded(&mut self) {}
    fn on_sprite_error(&mut self, _error: &Error) {}
    fn on_source_loaded(&mut self, _source_id: &str) {}
    fn on_source_error(&mut self, _source_id: &str, _error: &Error) {}
    fn on_tile_loaded(&mut self, _source_id: &str, _tile: TileId, _is_new_tile: bool) {}
    fn on_tile_error(&mut self, _source_id: &str, _tile: TileId, _error: &Error) {}
    fn on_placement_redone(&mut self) {}
    /// Rollup: some resource finished loading.
    fn on_resource_loaded(&mut self) {}
    /// Rollup: some resource failed, carrying the original error.
    fn on_resource_error(&mut self, _error: &Error) {}
}

/// Stand-in observer active until a real one is registered.
struct NullObserver;

impl Observer for NullObserver {}

/// Fans granular subsystem events into the single registered observer and
/// synthesizes the additive rollup notifications. Also owns the last recorded
/// error and the one-shot partial-tile reparse flag.
pub struct ResourceAggregator {
    observer: Box<dyn Observer>,
    last_error: Option<Arc<Error>>,
    /// One-shot: a tile parsed as partial may now be completable because new
    /// resources arrived. Consumed by the next update pass.
    should_reparse_partial_tiles: bool,
}

impl ResourceAggregator {
    pub fn new() -> Self {
        Self {
            observer: Box::new(NullObserver),
            last_error: None,
            should_reparse_partial_tiles: false,
        }
    }

    /// Replace the registered observer. The previous one is dropped; exactly
    /// one observer is active at a time.
    pub fn set_observer(&mut self, observer: Box<dyn Observer>) {
        self.observer = observer;
    }

    pub fn last_error(&self) -> Option<Arc<Error>> {
        self.last_error.clone()
    }

    /// Consume the one-shot reparse flag.
    pub fn take_reparse_flag(&mut self) -> bool {
        std::mem::take(&mut self.should_reparse_partial_tiles)
    }

    pub fn should_reparse_partial_tiles(&self) -> bool {
        self.should_reparse_partial_tiles
    }

    fn record(&mut self, error: Error) -> Arc<Error> {
        let error = Arc::new(error);
        self.last_error = Some(Arc::clone(&error));
        error
    }

    pub fn glyphs_loaded(&mut self, font_stack: &str, range: GlyphRange) {
        // Newly arrived glyphs can complete tiles parsed as partial.
        self.should_reparse_partial_tiles = true;
        self.observer.on_glyphs_loaded(font_stack, range);
        self.observer.on_resource_loaded();
    }

    pub fn glyphs_error(&mut self, font_stack: &str, range: GlyphRange, error: Error) {
        let error = self.record(error);
        self.observer.on_glyphs_error(font_stack, range, &error);
        self.observer.on_resource_error(&error);
    }

    pub fn sprite_loaded(&mut self) {
        self.observer.on_sprite_loaded();
        self.observer.on_resource_loaded();
    }

    pub fn sprite_error(&mut self, error: Error) {
        let error = self.record(error);
        self.observer.on_sprite_error(&error);
        self.observer.on_resource_error(&error);
    }

    pub fn source_loaded(&mut self, source_id: &str) {
        self.observer.on_source_loaded(source_id);
        self.observer.on_resource_loaded();
    }

    pub fn source_error(&mut self, source_id: &str, error: Error) {
        let error = self.record(error);
        self.observer.on_source_error(source_id, &error);
        self.observer.on_resource_error(&error);
    }

    pub fn tile_loaded(&mut self, source_id: &str, tile: TileId, is_new_tile: bool) {
        if is_new_tile {
            // A new tile may carry resources earlier partial parses waited on.
            self.should_reparse_partial_tiles = true;
        }
        self.observer.on_tile_loaded(source_id, tile, is_new_tile);
        self.observer.on_resource_loaded();
    }

    pub fn tile_error(&mut self, source_id: &str, tile: TileId, error: Error) {
        let error = self.record(error);
        self.observer.on_tile_error(source_id, tile, &error);
        self.observer.on_resource_error(&error);
    }

    pub fn placement_redone(&mut self) {
        self.observer.on_placement_redone();
    }

    /// Record a failure that has no granular observer event (style document
    /// errors); only the rollup fires.
    pub fn document_error(&mut self, error: Error) {
        let error = self.record(error);
        self.observer.on_resource_error(&error);
    }
}

impl Default for ResourceAggregator {
    fn default() -> Self {
        Self::new()
    }
}
