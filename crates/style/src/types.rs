//! Layer, source and document descriptors.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::function::PropertyValue;

/// Paint declarations: property name to declared value.
pub type PaintProperties = HashMap<String, PropertyValue>;

/// Time-boxing for property value changes: how long a change takes to play
/// out and how long it waits before starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyTransition {
    pub duration: Duration,
    pub delay: Duration,
}

impl PropertyTransition {
    pub const fn new(duration: Duration, delay: Duration) -> Self {
        Self { duration, delay }
    }

    pub fn is_instant(&self) -> bool {
        self.duration.is_zero() && self.delay.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Background,
    Fill,
    Line,
    Symbol,
    Raster,
}

impl LayerKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "background" => Some(LayerKind::Background),
            "fill" => Some(LayerKind::Fill),
            "line" => Some(LayerKind::Line),
            "symbol" => Some(LayerKind::Symbol),
            "raster" => Some(LayerKind::Raster),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Background => "background",
            LayerKind::Fill => "fill",
            LayerKind::Line => "line",
            LayerKind::Symbol => "symbol",
            LayerKind::Raster => "raster",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Layout visibility. A `None` layer stays in the draw order but produces no
/// render items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    None,
}

/// An ordered drawing instruction from the style document.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDesc {
    pub id: String,
    pub kind: LayerKind,
    /// Source id for tile-bound layers; `None` for background layers.
    pub source: Option<String>,
    /// Named layer inside the source's tiles (vector sources).
    pub source_layer: Option<String>,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub visibility: Visibility,
    /// Base paint declarations (the implicit default class).
    pub paint: PaintProperties,
    /// Per-class paint overrides, keyed by class name.
    pub class_paint: HashMap<String, PaintProperties>,
}

impl LayerDesc {
    pub fn new(id: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            kind,
            source: None,
            source_layer: None,
            min_zoom: 0.0,
            max_zoom: 24.0,
            visibility: Visibility::Visible,
            paint: PaintProperties::default(),
            class_paint: HashMap::new(),
        }
    }

    pub fn is_background(&self) -> bool {
        self.kind == LayerKind::Background
    }

    pub fn covers_zoom(&self, zoom: f64) -> bool {
        zoom >= self.min_zoom && zoom <= self.max_zoom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Raster,
    GeoJson,
}

impl SourceKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vector" => Some(SourceKind::Vector),
            "raster" => Some(SourceKind::Raster),
            "geojson" => Some(SourceKind::GeoJson),
            _ => None,
        }
    }
}

/// An identified provider of tiles for a geographic/zoom range.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDesc {
    pub id: String,
    pub kind: SourceKind,
    pub url: Option<String>,
    pub tile_size: u32,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl SourceDesc {
    pub fn new(id: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            url: None,
            tile_size: 512,
            min_zoom: 0,
            max_zoom: 22,
        }
    }
}

/// A parsed style document.
#[derive(Debug, Clone, Default)]
pub struct StyleDocument {
    pub version: u32,
    pub sources: Vec<SourceDesc>,
    pub layers: Vec<LayerDesc>,
    pub sprite: Option<String>,
    pub glyphs: Option<String>,
    /// Document-level transition applied to class/zoom driven changes.
    pub transition: Option<PropertyTransition>,
}
