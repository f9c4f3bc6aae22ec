//! Engine-side bookkeeping for one declared tile source.
//!
//! The actual fetch/decode machinery is a black box outside this crate; this
//! module tracks which tiles the viewport needs, which requests are
//! outstanding, and the buckets delivered for each tile.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::debug;
use style::SourceDesc;
use tile::{Bucket, LonLatBounds, TileData, TileId, tile_cover};

/// Parse/load state of one tile entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    /// Requested from the loader, nothing delivered yet.
    Loading,
    /// Decoded without all required resources; awaiting a full reparse.
    Partial,
    /// Fully decoded, buckets ready.
    Complete,
    /// Terminal load or decode failure.
    Errored,
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub id: TileId,
    pub state: TileState,
    /// Ready buckets keyed by style layer id.
    pub buckets: HashMap<String, Arc<Bucket>>,
    /// Update-pass sequence number of the last pass that needed this tile.
    last_needed: u64,
}

impl Tile {
    fn new(id: TileId) -> Self {
        Self { id, state: TileState::Loading, buckets: HashMap::new(), last_needed: 0 }
    }

    /// A tile is drawable once any parse delivered buckets.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, TileState::Partial | TileState::Complete)
    }
}

pub struct Source {
    desc: SourceDesc,
    loaded: bool,
    tiles: HashMap<TileId, Tile>,
    pending: HashSet<TileId>,
    needed: HashSet<TileId>,
    update_seq: u64,
}

impl Source {
    pub fn new(desc: SourceDesc) -> Self {
        Self {
            desc,
            loaded: false,
            tiles: HashMap::new(),
            pending: HashSet::new(),
            needed: HashSet::new(),
            update_seq: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.desc.id
    }

    pub fn desc(&self) -> &SourceDesc {
        &self.desc
    }

    /// The source's own metadata finished loading.
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Loaded and no outstanding tile requests.
    pub fn is_loaded(&self) -> bool {
        self.loaded && self.pending.is_empty()
    }

    pub fn has_pending_tiles(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Outstanding tile requests, sorted, for the loader to drain.
    pub fn pending_tiles(&self) -> Vec<TileId> {
        let mut pending: Vec<TileId> = self.pending.iter().copied().collect();
        pending.sort();
        pending
    }

    /// Recompute the needed tile set for the viewport and queue requests for
    /// tiles not yet held. With `reparse_partials`, partially parsed tiles
    /// are re-requested for a full parse (their current buckets stay
    /// drawable until the replacement arrives).
    pub fn update(
        &mut self,
        bounds: &LonLatBounds,
        zoom: f64,
        cache_size: usize,
        reparse_partials: bool,
    ) {
        self.update_seq += 1;
        let seq = self.update_seq;
        let z = zoom
            .floor()
            .clamp(f64::from(self.desc.min_zoom), f64::from(self.desc.max_zoom)) as u8;

        let cover = tile_cover(bounds, z);
        self.needed = cover.iter().copied().collect();
        for id in cover {
            let tile = self.tiles.entry(id).or_insert_with(|| Tile::new(id));
            tile.last_needed = seq;
            if tile.state == TileState::Loading {
                self.pending.insert(id);
            }
        }

        if reparse_partials {
            for (id, tile) in &self.tiles {
                if tile.state == TileState::Partial {
                    self.pending.insert(*id);
                }
            }
        }

        self.shed_cache(cache_size);
    }

    /// Accept delivered tile data. Returns `Some(is_new_tile)` when the
    /// delivery was applied, `None` for tiles this source no longer knows
    /// about (evicted, cancelled, or never requested).
    pub fn ingest(&mut self, id: TileId, data: TileData) -> Option<bool> {
        let tile = self.tiles.get_mut(&id)?;
        self.pending.remove(&id);
        let is_new = tile.state == TileState::Loading;
        tile.buckets = data
            .buckets
            .into_iter()
            .map(|bucket| (bucket.layer_id.clone(), Arc::new(bucket)))
            .collect();
        tile.state = if data.complete { TileState::Complete } else { TileState::Partial };
        Some(is_new)
    }

    /// Record a terminal failure for a known tile. Returns false for stale
    /// ids.
    pub fn ingest_error(&mut self, id: TileId) -> bool {
        let Some(tile) = self.tiles.get_mut(&id) else {
            return false;
        };
        self.pending.remove(&id);
        tile.state = TileState::Errored;
        tile.buckets.clear();
        true
    }

    /// Currently-needed tiles with drawable buckets, ordered by tile id.
    pub fn ready_tiles(&self) -> Vec<&Tile> {
        let mut tiles: Vec<&Tile> = self
            .needed
            .iter()
            .filter_map(|id| self.tiles.get(id))
            .filter(|tile| tile.is_ready())
            .collect();
        tiles.sort_by_key(|tile| tile.id);
        tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    /// Drop outstanding requests. Tiles that never received data are
    /// forgotten entirely so late deliveries are treated as stale.
    pub fn cancel_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        debug!("Source \"{}\": cancelling {} tile requests", self.desc.id, self.pending.len());
        let pending: Vec<TileId> = self.pending.drain().collect();
        for id in pending {
            if self.tiles.get(&id).is_some_and(|tile| tile.state == TileState::Loading) {
                self.tiles.remove(&id);
            }
        }
    }

    /// Shed every cached tile that is neither needed, nor requested, nor
    /// pinned by the renderer's current snapshot.
    pub fn on_low_memory(&mut self, pinned: &HashSet<TileId>) {
        let needed = &self.needed;
        let pending = &self.pending;
        let before = self.tiles.len();
        self.tiles
            .retain(|id, _| needed.contains(id) || pending.contains(id) || pinned.contains(id));
        let dropped = before - self.tiles.len();
        if dropped > 0 {
            debug!("Source \"{}\": dropped {} cached tiles on low memory", self.desc.id, dropped);
        }
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Evict retired tiles beyond the cache budget, oldest first. Needed and
    /// requested tiles are never evicted here.
    fn shed_cache(&mut self, cache_size: usize) {
        let mut retired: Vec<(u64, TileId)> = self
            .tiles
            .iter()
            .filter(|(id, _)| !self.needed.contains(*id) && !self.pending.contains(*id))
            .map(|(id, tile)| (tile.last_needed, *id))
            .collect();
        if retired.len() <= cache_size {
            return;
        }
        retired.sort();
        let excess = retired.len() - cache_size;
        for (_, id) in retired.into_iter().take(excess) {
            self.tiles.remove(&id);
        }
        debug!("Source \"{}\": evicted {} retired tiles", self.desc.id, excess);
    }
}
