use std::time::Duration;

use style::{Color, PropertyTransition, Value};
use style_engine::{RenderMode, Style, TimePoint};

const DOC: &str = r##"{
    "version": 8,
    "sources": { "a": { "type": "vector" } },
    "layers": [
        { "id": "background", "type": "background",
          "paint": { "background-color": "#000000" },
          "paint.night": { "background-color": "#0000ff" },
          "paint.alert": { "background-color": "#ff0000" } },
        { "id": "water", "type": "fill", "source": "a", "source-layer": "water",
          "paint": { "fill-color": "#0000ff" },
          "paint.night": { "fill-opacity": 0.5 } }
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

fn frame(style: &mut Style, zoom: f64, ms: u64) {
    style.cascade(t(ms), RenderMode::Continuous);
    style.recalculate(zoom, t(ms), RenderMode::Continuous);
}

#[test]
fn class_set_reflects_activation_order() {
    let mut style = style();
    assert_eq!(style.classes(), Vec::<String>::new());

    assert!(style.add_class("night", None));
    assert!(!style.add_class("night", None), "re-adding an active class is a no-op");
    assert!(style.add_class("alert", None));
    assert_eq!(style.classes(), ["night", "alert"]);
    assert!(style.has_class("night"));

    assert!(style.remove_class("night", None));
    assert!(!style.remove_class("night", None));
    assert!(!style.has_class("night"));
    assert_eq!(style.classes(), ["alert"]);

    assert!(style.set_classes(
        vec!["night".into(), "alert".into(), "night".into()],
        None
    ));
    assert_eq!(style.classes(), ["night", "alert"], "duplicates are dropped, order kept");
    assert!(
        !style.set_classes(vec!["night".into(), "alert".into()], None),
        "setting the same class set is a no-op"
    );
}

#[test]
fn later_class_wins_the_cascade() {
    let mut style = style();
    style.set_classes(vec!["night".into(), "alert".into()], None);
    frame(&mut style, 0.0, 0);
    assert_eq!(style.get_render_data().background_color, Color::new(1.0, 0.0, 0.0, 1.0));

    // Same classes, opposite activation order.
    style.set_classes(vec!["alert".into(), "night".into()], None);
    frame(&mut style, 0.0, 16);
    assert_eq!(style.get_render_data().background_color, Color::new(0.0, 0.0, 1.0, 1.0));
}

#[test]
fn class_toggle_transitions_between_resolved_values() {
    let mut style = style();
    frame(&mut style, 0.0, 0);
    assert_eq!(style.get_render_data().background_color, Color::BLACK);

    let transition = PropertyTransition::new(Duration::from_millis(400), Duration::ZERO);
    assert!(style.add_class("night", Some(transition)));

    style.cascade(t(1000), RenderMode::Continuous);
    assert!(style.has_transitions());
    style.recalculate(0.0, t(1000), RenderMode::Continuous);
    assert_eq!(style.get_render_data().background_color, Color::BLACK);

    style.recalculate(0.0, t(1200), RenderMode::Continuous);
    assert_eq!(style.get_render_data().background_color, Color::new(0.0, 0.0, 0.5, 1.0));

    style.recalculate(0.0, t(1400), RenderMode::Continuous);
    assert_eq!(style.get_render_data().background_color, Color::new(0.0, 0.0, 1.0, 1.0));
    assert!(!style.has_transitions(), "completed transitions are pruned");
}

#[test]
fn recascading_unchanged_classes_does_not_restart_transitions() {
    let mut style = style();
    frame(&mut style, 0.0, 0);

    let transition = PropertyTransition::new(Duration::from_millis(400), Duration::ZERO);
    style.add_class("night", Some(transition));
    style.cascade(t(1000), RenderMode::Continuous);
    style.recalculate(0.0, t(1000), RenderMode::Continuous);

    // A second cascade mid-flight with the same classes must leave the
    // in-flight transition untouched.
    style.cascade(t(1200), RenderMode::Continuous);
    style.recalculate(0.0, t(1400), RenderMode::Continuous);
    assert_eq!(style.get_render_data().background_color, Color::new(0.0, 0.0, 1.0, 1.0));
}

#[test]
fn still_mode_collapses_transitions() {
    let mut style = style();
    frame(&mut style, 0.0, 0);

    let transition = PropertyTransition::new(Duration::from_millis(400), Duration::ZERO);
    style.add_class("night", Some(transition));
    style.cascade(t(1000), RenderMode::Still);
    assert!(!style.has_transitions());
    style.recalculate(0.0, t(1000), RenderMode::Still);
    assert_eq!(style.get_render_data().background_color, Color::new(0.0, 0.0, 1.0, 1.0));
}

#[test]
fn removing_a_class_reverts_to_base_and_defaults() {
    let mut style = style();
    style.add_class("night", None);
    frame(&mut style, 0.0, 0);
    let paint = style.evaluated_paint("water").expect("water paint");
    assert_eq!(paint.get("fill-opacity"), Some(&Value::Number(0.5)));

    style.remove_class("night", None);
    frame(&mut style, 0.0, 16);
    let paint = style.evaluated_paint("water").expect("water paint");
    // The class-only property falls back to its default once no declaration
    // is left for it.
    assert_eq!(paint.get("fill-opacity"), Some(&Value::Number(1.0)));
    assert_eq!(
        paint.get("fill-color"),
        Some(&Value::Color(Color::new(0.0, 0.0, 1.0, 1.0))),
        "base declarations are unaffected"
    );
}
