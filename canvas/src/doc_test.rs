#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

fn bounds() -> Size {
    Size::new(800.0, 600.0)
}

fn floor() -> Size {
    Size::new(10.0, 7.0)
}

fn position_json(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "map_id": 3,
        "x": 120.0,
        "y": 80.5,
        "width": 100.0,
        "height": 50.0,
        "rotation": 15.0,
        "color": "red",
        "stroke_color": "black",
        "stroke_width": 1.0,
        "is_visible": true,
        "created_at": "2025-06-01T10:00:00Z",
        "updated_at": null
    })
}

// =============================================================
// PlacementId
// =============================================================

#[test]
fn placement_id_server_accessor() {
    assert_eq!(PlacementId::Server(42).server(), Some(42));
    assert_eq!(PlacementId::Pending(1).server(), None);
}

#[test]
fn placement_id_display() {
    assert_eq!(PlacementId::Server(42).to_string(), "42");
    assert_eq!(PlacementId::Pending(7).to_string(), "pending-7");
}

#[test]
fn placement_id_pending_flag() {
    assert!(PlacementId::Pending(0).is_pending());
    assert!(!PlacementId::Server(0).is_pending());
}

// =============================================================
// Wire records
// =============================================================

#[test]
fn position_record_ignores_timestamps() {
    let rec: PositionRecord = serde_json::from_value(position_json(9)).unwrap();
    assert_eq!(rec.id, 9);
    assert_eq!(rec.color, "red");
    assert_eq!(rec.y, 80.5);
}

#[test]
fn map_with_boats_parses_unbound_entries() {
    let body = json!({
        "map": {
            "id": 3,
            "name": "Pier 11",
            "image_path": "pier11.png",
            "image_width": 794,
            "image_height": 1123,
            "created_at": "2025-06-01T10:00:00Z"
        },
        "boats": [
            { "boat": null, "position": position_json(1) },
            {
                "boat": { "id": 5, "index": 12, "name": "Sea Breeze", "customer_name": "Ada" },
                "position": position_json(2)
            }
        ]
    });
    let rec: MapWithBoatsRecord = serde_json::from_value(body).unwrap();
    assert_eq!(rec.map.image_width, 794);
    assert!(rec.map.is_active);
    assert_eq!(rec.boats.len(), 2);
    assert!(rec.boats[0].boat.is_none());
    let boat = rec.boats[1].boat.as_ref().unwrap();
    assert_eq!(boat.extra.get("customer_name"), Some(&json!("Ada")));
}

#[test]
fn map_with_boats_defaults_empty_boats() {
    let body = json!({
        "map": { "id": 1, "name": "m", "image_path": "m.png", "image_width": 10, "image_height": 10 }
    });
    let rec: MapWithBoatsRecord = serde_json::from_value(body).unwrap();
    assert!(rec.boats.is_empty());
}

#[test]
fn patch_serializes_only_present_fields_with_wire_names() {
    let patch = PlacementPatch { x: Some(15.0), fill: Some("red".into()), visible: Some(false), ..Default::default() };
    let value = serde_json::to_value(&patch).unwrap();
    assert_eq!(value, json!({ "x": 15.0, "color": "red", "is_visible": false }));
}

#[test]
fn patch_default_is_empty() {
    assert!(PlacementPatch::default().is_empty());
    assert!(!PlacementPatch::position(1.0, 2.0).is_empty());
}

#[test]
fn patch_snapshot_round_trips_every_field() {
    let placement = Placement::from(serde_json::from_value::<PositionRecord>(position_json(4)).unwrap());
    let snap = PlacementPatch::snapshot(&placement);
    assert_eq!(snap.x, Some(120.0));
    assert_eq!(snap.rotation, Some(15.0));
    assert_eq!(snap.fill.as_deref(), Some("red"));
    assert_eq!(snap.visible, Some(true));
}

#[test]
fn patch_apply_geometry_keeps_absent_fields() {
    let g = Geometry { x: 1.0, y: 2.0, width: 3.0, height: 4.0, rotation: 5.0 };
    let out = PlacementPatch { y: Some(20.0), rotation: Some(-5.0), ..Default::default() }.apply_geometry(g);
    assert_eq!(out, Geometry { x: 1.0, y: 20.0, width: 3.0, height: 4.0, rotation: -5.0 });
}

// =============================================================
// Session types
// =============================================================

#[test]
fn map_document_size_and_center() {
    let map = MapDocument {
        id: 1,
        name: "m".into(),
        image_path: "m.png".into(),
        image_width: 800,
        image_height: 600,
    };
    assert_eq!(map.size(), Size::new(800.0, 600.0));
    assert_eq!(map.center(), Point::new(400.0, 300.0));
}

#[test]
fn placement_from_record_uses_server_id() {
    let placement = Placement::from(serde_json::from_value::<PositionRecord>(position_json(4)).unwrap());
    assert_eq!(placement.id, PlacementId::Server(4));
    assert_eq!(placement.style.fill, "red");
    assert_eq!(placement.geometry.width, 100.0);
}

#[test]
fn placement_apply_style_ignores_geometry() {
    let mut placement = Placement::from(serde_json::from_value::<PositionRecord>(position_json(4)).unwrap());
    let patch = PlacementPatch { x: Some(0.0), stroke_width: Some(2.5), visible: Some(false), ..Default::default() };
    placement.apply_style(&patch);
    assert_eq!(placement.geometry.x, 120.0);
    assert_eq!(placement.style.stroke_width, 2.5);
    assert!(!placement.visible);
}

#[test]
fn to_new_position_copies_fields() {
    let placement = Placement::from(serde_json::from_value::<PositionRecord>(position_json(4)).unwrap());
    let body = placement.to_new_position();
    assert_eq!(body.map_id, 3);
    assert_eq!(body.color, "red");
    assert_eq!(body.x, 120.0);
}

#[test]
fn binding_label_prefers_name() {
    let boat = BoatRecord { id: 1, index: 12, name: Some("Sea Breeze".into()), extra: serde_json::Map::new() };
    assert_eq!(EntityBinding::from(&boat).label, "Sea Breeze");
}

#[test]
fn binding_label_falls_back_to_index() {
    let boat = BoatRecord { id: 1, index: 12, name: Some("  ".into()), extra: serde_json::Map::new() };
    assert_eq!(EntityBinding::from(&boat).label, "#12");
    let unnamed = BoatRecord { id: 1, index: 3, name: None, extra: serde_json::Map::new() };
    assert_eq!(EntityBinding::from(&unnamed).label, "#3");
}

#[test]
fn unbound_label_names_position() {
    let entry = PlacementWithBinding {
        placement: Placement::from(serde_json::from_value::<PositionRecord>(position_json(8)).unwrap()),
        binding: None,
    };
    assert_eq!(entry.label(), "Position #8");
}

// =============================================================
// Geometry clamping
// =============================================================

#[test]
fn centered_at_offsets_by_half_size() {
    let g = Geometry::centered_at(Point::new(100.0, 100.0), 100.0, 50.0);
    assert_eq!((g.x, g.y), (50.0, 75.0));
    assert_eq!(g.center(), Point::new(100.0, 100.0));
}

#[test]
fn clamp_keeps_in_range_values() {
    let g = Geometry { x: 10.0, y: 10.0, width: 100.0, height: 50.0, rotation: 45.0 };
    assert_eq!(g.clamped(bounds(), floor()), g);
}

#[test]
fn clamp_pulls_position_into_image() {
    let g = Geometry { x: -5.0, y: 900.0, width: 100.0, height: 50.0, rotation: 0.0 };
    let c = g.clamped(bounds(), floor());
    assert_eq!((c.x, c.y), (0.0, 600.0));
}

#[test]
fn clamp_allows_edges() {
    let g = Geometry { x: 800.0, y: 0.0, width: 100.0, height: 50.0, rotation: 0.0 };
    let c = g.clamped(bounds(), floor());
    assert_eq!((c.x, c.y), (800.0, 0.0));
}

#[test]
fn clamp_enforces_size_floor() {
    let g = Geometry { x: 0.0, y: 0.0, width: 2.0, height: -4.0, rotation: 0.0 };
    let c = g.clamped(bounds(), floor());
    assert_eq!((c.width, c.height), (10.0, 7.0));
}

#[test]
fn clamp_handles_non_finite_input() {
    let g = Geometry { x: f64::NAN, y: f64::INFINITY, width: f64::NAN, height: f64::INFINITY, rotation: f64::NAN };
    let c = g.clamped(bounds(), floor());
    assert_eq!(c, Geometry { x: 0.0, y: 600.0, width: 10.0, height: 7.0, rotation: 0.0 });
}

#[test]
fn rotation_keeps_sign_within_full_turn() {
    assert_eq!(normalize_rotation(365.0), 5.0);
    assert_eq!(normalize_rotation(-370.0), -10.0);
    assert_eq!(normalize_rotation(-90.0), -90.0);
    assert_eq!(normalize_rotation(360.0), 0.0);
}
