//! JSON style-document parser.
//!
//! Parsing is forgiving where the document is merely incomplete (unknown
//! layer kinds and unreadable property values are warned about and skipped)
//! and strict where the document is structurally wrong (malformed JSON,
//! duplicate ids, layers referencing sources that do not exist).

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use log::warn;
use serde_json::Value as Json;

use crate::function::{Function, PropertyValue, Stops};
use crate::types::{
    LayerDesc, LayerKind, PropertyTransition, SourceDesc, SourceKind, StyleDocument, Visibility,
};
use crate::value::{Color, Value};

/// Parse a style document. Relative sprite/glyph/source URLs are resolved
/// against `base`.
pub fn parse_style(data: &str, base: &str) -> Result<StyleDocument> {
    let root: Json = serde_json::from_str(data).context("style document is not valid JSON")?;
    let root = root
        .as_object()
        .ok_or_else(|| anyhow!("style document root must be an object"))?;

    let mut doc = StyleDocument {
        version: root.get("version").and_then(Json::as_u64).unwrap_or(8) as u32,
        ..StyleDocument::default()
    };

    if let Some(transition) = root.get("transition").and_then(Json::as_object) {
        let duration = transition.get("duration").and_then(Json::as_u64).unwrap_or(0);
        let delay = transition.get("delay").and_then(Json::as_u64).unwrap_or(0);
        doc.transition = Some(PropertyTransition::new(
            Duration::from_millis(duration),
            Duration::from_millis(delay),
        ));
    }

    if let Some(sources) = root.get("sources") {
        let sources = sources
            .as_object()
            .ok_or_else(|| anyhow!("\"sources\" must be an object"))?;
        for (id, value) in sources {
            doc.sources.push(parse_source(id, value, base)?);
        }
    }

    let source_ids: HashSet<&str> = doc.sources.iter().map(|s| s.id.as_str()).collect();

    if let Some(layers) = root.get("layers") {
        let layers = layers
            .as_array()
            .ok_or_else(|| anyhow!("\"layers\" must be an array"))?;
        let mut seen = HashSet::new();
        for value in layers {
            let Some(layer) = parse_layer(value)? else {
                continue;
            };
            if !seen.insert(layer.id.clone()) {
                bail!("duplicate layer id \"{}\"", layer.id);
            }
            if let Some(source) = &layer.source {
                if !source_ids.contains(source.as_str()) {
                    bail!("layer \"{}\" references unknown source \"{}\"", layer.id, source);
                }
            } else if !layer.is_background() {
                bail!("layer \"{}\" of kind {} requires a source", layer.id, layer.kind);
            }
            doc.layers.push(layer);
        }
    }

    doc.sprite = root
        .get("sprite")
        .and_then(Json::as_str)
        .map(|url| resolve_url(base, url));
    doc.glyphs = root
        .get("glyphs")
        .and_then(Json::as_str)
        .map(|url| resolve_url(base, url));

    Ok(doc)
}

fn parse_source(id: &str, value: &Json, base: &str) -> Result<SourceDesc> {
    let obj = value
        .as_object()
        .ok_or_else(|| anyhow!("source \"{id}\" must be an object"))?;
    let kind_name = obj
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| anyhow!("source \"{id}\" is missing \"type\""))?;
    let kind = SourceKind::from_name(kind_name)
        .ok_or_else(|| anyhow!("source \"{id}\" has unknown type \"{kind_name}\""))?;

    let mut desc = SourceDesc::new(id, kind);
    desc.url = obj
        .get("url")
        .and_then(Json::as_str)
        .map(|url| resolve_url(base, url));
    if let Some(size) = obj.get("tileSize").and_then(Json::as_u64) {
        desc.tile_size = size as u32;
    }
    if let Some(z) = obj.get("minzoom").and_then(Json::as_u64) {
        desc.min_zoom = z.min(31) as u8;
    }
    if let Some(z) = obj.get("maxzoom").and_then(Json::as_u64) {
        desc.max_zoom = z.min(31) as u8;
    }
    Ok(desc)
}

/// Parse one layer. Returns Ok(None) for layers of an unknown kind, which are
/// skipped rather than failing the whole document.
fn parse_layer(value: &Json) -> Result<Option<LayerDesc>> {
    let obj = value
        .as_object()
        .ok_or_else(|| anyhow!("each layer must be an object"))?;
    let id = obj
        .get("id")
        .and_then(Json::as_str)
        .ok_or_else(|| anyhow!("layer is missing \"id\""))?;
    let kind_name = obj
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| anyhow!("layer \"{id}\" is missing \"type\""))?;
    let Some(kind) = LayerKind::from_name(kind_name) else {
        warn!("Style: skipping layer \"{id}\" of unsupported kind \"{kind_name}\"");
        return Ok(None);
    };

    let mut layer = LayerDesc::new(id, kind);
    layer.source = obj.get("source").and_then(Json::as_str).map(str::to_string);
    layer.source_layer = obj
        .get("source-layer")
        .and_then(Json::as_str)
        .map(str::to_string);
    if let Some(z) = obj.get("minzoom").and_then(Json::as_f64) {
        layer.min_zoom = z;
    }
    if let Some(z) = obj.get("maxzoom").and_then(Json::as_f64) {
        layer.max_zoom = z;
    }
    if let Some(layout) = obj.get("layout").and_then(Json::as_object) {
        if layout.get("visibility").and_then(Json::as_str) == Some("none") {
            layer.visibility = Visibility::None;
        }
    }

    for (key, value) in obj {
        if key == "paint" {
            layer.paint = parse_paint(id, value)?;
        } else if let Some(class) = key.strip_prefix("paint.") {
            layer
                .class_paint
                .insert(class.to_string(), parse_paint(id, value)?);
        }
    }
    Ok(Some(layer))
}

fn parse_paint(layer_id: &str, value: &Json) -> Result<crate::types::PaintProperties> {
    let obj = value
        .as_object()
        .ok_or_else(|| anyhow!("paint block of layer \"{layer_id}\" must be an object"))?;
    let mut paint = crate::types::PaintProperties::default();
    for (name, raw) in obj {
        match parse_property_value(name, raw) {
            Ok(value) => {
                paint.insert(name.clone(), value);
            }
            Err(err) => {
                warn!("Style: skipping paint property \"{name}\" of layer \"{layer_id}\": {err}");
            }
        }
    }
    Ok(paint)
}

fn parse_property_value(name: &str, raw: &Json) -> Result<PropertyValue> {
    if let Some(obj) = raw.as_object() {
        if obj.contains_key("stops") {
            return parse_function(name, obj).map(PropertyValue::Function);
        }
        bail!("object value without \"stops\"");
    }
    parse_constant(name, raw).map(PropertyValue::Constant)
}

fn parse_constant(name: &str, raw: &Json) -> Result<Value> {
    match raw {
        Json::Number(n) => Ok(Value::Number(n.as_f64().unwrap_or(0.0))),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::String(s) => {
            if name.ends_with("-color") {
                Color::parse(s)
                    .map(Value::Color)
                    .ok_or_else(|| anyhow!("\"{s}\" is not a color"))
            } else {
                Ok(Value::Str(s.clone()))
            }
        }
        other => bail!("unsupported value {other}"),
    }
}

fn parse_function(
    name: &str,
    obj: &serde_json::Map<String, Json>,
) -> Result<Function> {
    let raw_stops = obj
        .get("stops")
        .and_then(Json::as_array)
        .ok_or_else(|| anyhow!("\"stops\" must be an array"))?;
    let mut stops = Stops::new();
    for stop in raw_stops {
        let pair = stop
            .as_array()
            .filter(|p| p.len() == 2)
            .ok_or_else(|| anyhow!("each stop must be a [zoom, value] pair"))?;
        let zoom = pair[0]
            .as_f64()
            .ok_or_else(|| anyhow!("stop zoom must be a number"))?;
        stops.push((zoom, parse_constant(name, &pair[1])?));
    }
    if stops.is_empty() {
        bail!("\"stops\" must not be empty");
    }
    stops.sort_by(|a, b| a.0.total_cmp(&b.0));

    let kind = obj.get("type").and_then(Json::as_str).unwrap_or("exponential");
    match kind {
        "exponential" => Ok(Function::Exponential {
            base: obj.get("base").and_then(Json::as_f64).unwrap_or(1.0),
            stops,
        }),
        "interval" => Ok(Function::Interval { stops }),
        "categorical" => Ok(Function::Categorical { stops }),
        other => bail!("unknown function type \"{other}\""),
    }
}

/// Resolve `url` against `base`. Absolute URLs pass through untouched.
fn resolve_url(base: &str, url: &str) -> String {
    if base.is_empty() || url.contains("://") {
        return url.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
}
