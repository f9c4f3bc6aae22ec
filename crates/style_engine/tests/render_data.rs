use style::{Color, LayerDesc, LayerKind};
use style_engine::{RenderMode, Style, TimePoint, UpdateParameters};
use tile::{Bucket, Feature, LonLatBounds, TileData, TileId};

const DOC: &str = r##"{
    "version": 8,
    "sources": { "a": { "type": "vector" } },
    "layers": [
        { "id": "background", "type": "background",
          "paint": { "background-color": "#000000" } },
        { "id": "water", "type": "fill", "source": "a", "source-layer": "water",
          "paint": { "fill-color": "#0000ff" } },
        { "id": "roads", "type": "line", "source": "a", "source-layer": "road",
          "paint": { "line-width": 2 } }
    ]
}"##;

fn style() -> Style {
    let mut style = Style::new();
    assert!(style.set_json(DOC, ""));
    style
}

fn t(ms: u64) -> TimePoint {
    TimePoint::from_millis(ms)
}

fn bounds() -> LonLatBounds {
    LonLatBounds::new(0.02, 0.02, 0.05, 0.05)
}

fn params(zoom: f64, ms: u64) -> UpdateParameters {
    UpdateParameters { zoom, now: t(ms), bounds: bounds() }
}

fn tile_data(layers: &[&str]) -> TileData {
    TileData::complete(
        layers
            .iter()
            .map(|layer| {
                Bucket::with_features(*layer, vec![Feature::new(Some(1), "features", 0.0, 0.0)])
            })
            .collect(),
    )
}

/// Run a frame and deliver every pending tile of source "a".
fn frame_with_tiles(style: &mut Style, zoom: f64, ms: u64) {
    style.cascade(t(ms), RenderMode::Continuous);
    style.recalculate(zoom, t(ms), RenderMode::Continuous);
    style.update(&params(zoom, ms));
    for id in style.get_source("a").expect("source a").pending_tiles() {
        style.tile_loaded("a", id, tile_data(&["water", "roads"]));
    }
}

#[test]
fn composes_layers_in_draw_order_with_tiles_and_buckets() {
    let mut style = style();
    frame_with_tiles(&mut style, 10.0, 0);

    let expected_tile = TileId::new(10, 512, 511);
    let render = style.get_render_data();

    assert_eq!(render.background_color, Color::BLACK);
    assert_eq!(render.sources.iter().collect::<Vec<_>>(), [&"a".to_string()]);

    let ids: Vec<&str> = render.order.iter().map(|item| item.layer.id.as_str()).collect();
    assert_eq!(ids, ["background", "water", "roads"]);

    let background = &render.order[0];
    assert!(background.tile.is_none());
    assert!(background.bucket.is_none());

    for item in &render.order[1..] {
        assert_eq!(item.tile, Some(expected_tile));
        let bucket = item.bucket.as_ref().expect("tile-bound item has a bucket");
        assert_eq!(bucket.layer_id, item.layer.id);
    }
}

#[test]
fn draw_order_follows_removal_and_reinsertion() {
    let mut style = style();
    frame_with_tiles(&mut style, 10.0, 0);

    style.remove_layer("water").expect("water exists");
    let ids: Vec<String> =
        style.get_render_data().order.iter().map(|item| item.layer.id.clone()).collect();
    assert_eq!(ids, ["background", "roads"]);

    // Re-insert before "roads"; the already-delivered bucket becomes drawable
    // again.
    let mut water = LayerDesc::new("water", LayerKind::Fill);
    water.source = Some("a".into());
    water.source_layer = Some("water".into());
    style.add_layer(water, Some("roads")).expect("insert before roads");
    let ids: Vec<String> =
        style.get_render_data().order.iter().map(|item| item.layer.id.clone()).collect();
    assert_eq!(ids, ["background", "water", "roads"]);
}

#[test]
fn structural_errors_leave_state_untouched() {
    let mut style = style();

    let duplicate = LayerDesc::new("water", LayerKind::Fill);
    assert!(style.add_layer(duplicate, None).is_err());

    let mut orphan = LayerDesc::new("labels", LayerKind::Symbol);
    orphan.source = Some("a".into());
    assert!(style.add_layer(orphan, Some("no-such-layer")).is_err());
    assert!(style.get_layer("labels").is_none(), "failed insert leaves no trace");

    assert!(style.remove_layer("no-such-layer").is_err());
    assert!(style.remove_source("no-such-source").is_err());
    assert_eq!(style.layers().len(), 3);
}

#[test]
fn referenced_sources_appear_even_without_ready_tiles() {
    let mut style = style();
    style.cascade(t(0), RenderMode::Continuous);
    style.recalculate(10.0, t(0), RenderMode::Continuous);
    style.update(&params(10.0, 0));
    // Nothing delivered: no tile-bound items, but the source is listed so the
    // renderer can set up source-level state.
    let render = style.get_render_data();
    assert_eq!(render.sources.iter().collect::<Vec<_>>(), [&"a".to_string()]);
    let ids: Vec<&str> = render.order.iter().map(|item| item.layer.id.as_str()).collect();
    assert_eq!(ids, ["background"]);
}

#[test]
fn background_color_is_transparent_without_a_background_layer() {
    let mut style = Style::new();
    assert!(style.set_json(
        r#"{ "sources": { "a": { "type": "vector" } },
             "layers": [ { "id": "water", "type": "fill", "source": "a" } ] }"#,
        ""
    ));
    style.cascade(t(0), RenderMode::Continuous);
    style.recalculate(0.0, t(0), RenderMode::Continuous);
    assert_eq!(style.get_render_data().background_color, Color::TRANSPARENT);
}

#[test]
fn hidden_and_out_of_range_layers_are_skipped() {
    let mut style = Style::new();
    assert!(style.set_json(
        r##"{ "layers": [
                { "id": "background", "type": "background", "minzoom": 5,
                  "paint": { "background-color": "#ffffff" } },
                { "id": "hidden", "type": "background",
                  "layout": { "visibility": "none" } }
            ] }"##,
        ""
    ));
    style.cascade(t(0), RenderMode::Continuous);
    style.recalculate(2.0, t(0), RenderMode::Continuous);
    let render = style.get_render_data();
    assert!(render.order.is_empty(), "below minzoom and hidden layers emit nothing");
    assert_eq!(render.background_color, Color::TRANSPARENT);

    style.recalculate(6.0, t(16), RenderMode::Continuous);
    let render = style.get_render_data();
    let ids: Vec<&str> = render.order.iter().map(|item| item.layer.id.as_str()).collect();
    assert_eq!(ids, ["background"]);
    assert_eq!(render.background_color, Color::WHITE);
}

#[test]
fn snapshots_survive_later_mutations() {
    let mut style = style();
    frame_with_tiles(&mut style, 10.0, 0);
    let snapshot = style.get_render_data();

    style.remove_layer("water").expect("water exists");
    style.remove_source("a").expect("source a exists");
    style.on_low_memory();

    // The snapshot taken earlier is value-typed: it still lists every item
    // and its buckets remain readable.
    let ids: Vec<&str> = snapshot.order.iter().map(|item| item.layer.id.as_str()).collect();
    assert_eq!(ids, ["background", "water", "roads"]);
    let bucket = snapshot.order[1].bucket.as_ref().expect("bucket still alive");
    assert_eq!(bucket.features.len(), 1);
}
