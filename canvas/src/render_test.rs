#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{BoatRecord, BoatWithPositionRecord, MapRecord, MapWithBoatsRecord, PositionRecord};

fn position(id: i64, x: f64, visible: bool) -> PositionRecord {
    PositionRecord {
        id,
        map_id: 1,
        x,
        y: 100.0,
        width: 100.0,
        height: 50.0,
        rotation: 30.0,
        color: "green".into(),
        stroke_color: "black".into(),
        stroke_width: 1.0,
        is_visible: visible,
    }
}

/// 800×600 map: two bound placements and one unbound, hidden one.
fn store() -> PositionStore {
    let mut store = PositionStore::new(Size::new(10.0, 7.0));
    let ticket = store.begin_load(1);
    let boat = |id, name: &str| BoatRecord { id, index: id, name: Some(name.into()), extra: serde_json::Map::new() };
    let record = MapWithBoatsRecord {
        map: MapRecord {
            id: 1,
            name: "Pier 11".into(),
            description: None,
            image_path: "pier11.png".into(),
            image_width: 800,
            image_height: 600,
            is_active: true,
        },
        boats: vec![
            BoatWithPositionRecord { boat: Some(boat(7, "Wave")), position: position(1, 100.0, true) },
            BoatWithPositionRecord { boat: Some(boat(8, "Gull")), position: position(2, 300.0, true) },
            BoatWithPositionRecord { boat: None, position: position(3, 500.0, false) },
        ],
    };
    store.complete_load(&ticket, Ok(record)).unwrap();
    store
}

fn viewport() -> Size {
    Size::new(400.0, 300.0)
}

fn s(id: i64) -> PlacementId {
    PlacementId::Server(id)
}

// =============================================================
// Layout
// =============================================================

#[test]
fn empty_store_has_no_background() {
    let store = PositionStore::new(Size::new(10.0, 7.0));
    let scene = scene(&store, &InteractionState::default(), viewport(), &EditorConfig::default());
    assert!(scene.background.is_none());
    assert!(scene.sprites.is_empty());
    assert!(scene.overlay.is_none());
    assert!(!scene.toolbar.can_add);
}

#[test]
fn background_is_scaled_to_fit() {
    let scene = scene(&store(), &InteractionState::default(), viewport(), &EditorConfig::default());
    assert_eq!(scene.scale, 0.5);
    let bg = scene.background.unwrap();
    assert_eq!(bg.size, Size::new(400.0, 300.0));
    assert_eq!(bg.image_url, "/assets/maps/pier11.png");
}

#[test]
fn sprites_follow_draw_order_and_transform() {
    let scene = scene(&store(), &InteractionState::default(), viewport(), &EditorConfig::default());
    let ids: Vec<_> = scene.sprites.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![s(1), s(2), s(3)]);

    let first = &scene.sprites[0];
    // Box (100,100,100,50) → center (150,125) → ×0.5.
    assert_eq!(first.center, Point::new(75.0, 62.5));
    assert_eq!(first.size, Size::new(50.0, 25.0));
    assert_eq!(first.rotation, 30.0);
}

#[test]
fn zoom_multiplies_the_fit_scale() {
    let mut state = InteractionState::default();
    state.set_zoom(2.0);
    let scene = scene(&store(), &state, viewport(), &EditorConfig::default());
    assert_eq!(scene.scale, 1.0);
    assert_eq!(scene.sprites[0].center, Point::new(150.0, 125.0));
    assert_eq!(scene.toolbar.zoom_percent, 200);
}

// =============================================================
// Styling
// =============================================================

#[test]
fn unselected_bound_sprite_keeps_its_style() {
    let scene = scene(&store(), &InteractionState::default(), viewport(), &EditorConfig::default());
    let sprite = &scene.sprites[0];
    assert_eq!(sprite.fill, "green");
    assert_eq!(sprite.opacity, 1.0);
    assert_eq!(sprite.stroke_width, 0.5);
    assert!(sprite.halo.is_none());
    assert_eq!(sprite.shadow_blur, 0.0);
}

#[test]
fn unbound_sprite_is_gray_and_unlabelled() {
    let scene = scene(&store(), &InteractionState::default(), viewport(), &EditorConfig::default());
    let sprite = &scene.sprites[2];
    assert_eq!(sprite.fill, UNBOUND_FILL);
    assert!(sprite.label.is_none());
}

#[test]
fn hidden_sprite_is_translucent() {
    let scene = scene(&store(), &InteractionState::default(), viewport(), &EditorConfig::default());
    assert_eq!(scene.sprites[2].opacity, HIDDEN_OPACITY);
}

#[test]
fn label_font_is_capped() {
    let scene = scene(&store(), &InteractionState::default(), viewport(), &EditorConfig::default());
    let label = scene.sprites[0].label.as_ref().unwrap();
    assert_eq!(label.text, "Wave");
    // min(100 / 4, 14) = 14 image px → 7 viewport px.
    assert_eq!(label.font_size, 7.0);
    assert_eq!(label.fill, "white");
}

#[test]
fn selected_sprite_is_highlighted() {
    let store = store();
    let mut state = InteractionState::default();
    state.select(s(2), &store).unwrap();
    let scene = scene(&store, &state, viewport(), &EditorConfig::default());

    let sprite = &scene.sprites[1];
    assert_eq!(sprite.fill, SELECTED_FILL);
    assert_eq!(sprite.stroke_width, SELECTED_STROKE_WIDTH * 0.5);
    assert_eq!(sprite.shadow_blur, 10.0);
    let halo = sprite.halo.as_ref().unwrap();
    assert_eq!(halo.size, Size::new(55.0, 30.0));
    assert_eq!(halo.dash, [2.5, 2.5]);

    assert!(scene.sprites[0].halo.is_none());
}

#[test]
fn dragging_sprite_is_faded() {
    let store = store();
    let mut state = InteractionState::default();
    state.select(s(1), &store).unwrap();
    state.begin_drag();
    let scene = scene(&store, &state, viewport(), &EditorConfig::default());
    let sprite = &scene.sprites[0];
    assert_eq!(sprite.opacity, DRAGGING_OPACITY);
    assert_eq!(sprite.stroke_width, DRAGGING_STROKE_WIDTH * 0.5);
    assert_eq!(sprite.fill, SELECTED_FILL);
}

// =============================================================
// Overlay and toolbar
// =============================================================

#[test]
fn overlay_lists_map_and_count() {
    let scene = scene(&store(), &InteractionState::default(), viewport(), &EditorConfig::default());
    let overlay = scene.overlay.unwrap();
    assert_eq!(overlay.title, "Pier 11");
    assert_eq!(overlay.subtitle, "3 positions");
    assert!(overlay.hint.is_none());
}

#[test]
fn selection_adds_hint_and_panel() {
    let store = store();
    let mut state = InteractionState::default();
    state.select(s(3), &store).unwrap();
    let scene = scene(&store, &state, viewport(), &EditorConfig::default());
    assert!(scene.overlay.unwrap().hint.unwrap().contains("WASD"));
    let panel = scene.toolbar.selection.unwrap();
    assert_eq!(panel.label, "Position #3");
    assert_eq!(panel.help.len(), 3);
    assert!(scene.toolbar.can_delete);
}

#[test]
fn toolbar_reflects_zoom_limits_and_input_toggle() {
    let store = store();
    let mut state = InteractionState::default();
    state.set_zoom(3.0);
    state.set_interactive(false);
    let scene = scene(&store, &state, viewport(), &EditorConfig::default());
    assert!(!scene.toolbar.can_zoom_in);
    assert!(scene.toolbar.can_zoom_out);
    assert!(!scene.toolbar.can_add);
    assert!(!scene.toolbar.interactive);
}

#[test]
fn scene_serializes_for_hosts() {
    let scene = scene(&store(), &InteractionState::default(), viewport(), &EditorConfig::default());
    let value = serde_json::to_value(&scene).unwrap();
    assert_eq!(value["sprites"][0]["id"]["Server"], 1);
    assert_eq!(value["overlay"]["title"], "Pier 11");
}
