//! Document model: maps, placements, boat bindings, and their wire records.
//!
//! Two layers live here. The *wire records* (`MapRecord`, `PositionRecord`,
//! `BoatRecord`, `MapWithBoatsRecord`, `NewPosition`, `PlacementPatch`) mirror
//! the JSON exchanged with the CRUD service. The *session types*
//! (`MapDocument`, `Placement`, `EntityBinding`, `PlacementWithBinding`) are
//! what the store and renderer work with. Placements get a `PlacementId` that
//! can also name a placement the server has not confirmed yet.
//!
//! Geometry clamping lives on [`Geometry::clamped`]; the store calls it on
//! every mutation so placements never leave the image.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::camera::{Point, Size};

/// Server identifier of a map.
pub type MapId = i64;

/// Server identifier of a boat listing.
pub type BoatId = i64;

/// Identifier of a placement in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PlacementId {
    /// Assigned by the server.
    Server(i64),
    /// Locally generated for an optimistic create that has not been confirmed.
    Pending(u64),
}

impl PlacementId {
    /// The server id, if the placement has been confirmed.
    #[must_use]
    pub fn server(self) -> Option<i64> {
        match self {
            Self::Server(id) => Some(id),
            Self::Pending(_) => None,
        }
    }

    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl fmt::Display for PlacementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(id) => write!(f, "{id}"),
            Self::Pending(n) => write!(f, "pending-{n}"),
        }
    }
}

// =============================================================
// Wire records
// =============================================================

/// A map as returned by `GET /maps/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRecord {
    pub id: MapId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_path: String,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A boat position as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub id: i64,
    pub map_id: MapId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub color: String,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub is_visible: bool,
}

/// A boat listing. Only `id`, `index` and `name` are read; everything else is
/// carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoatRecord {
    pub id: BoatId,
    pub index: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One entry of `MapWithBoatsRecord::boats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoatWithPositionRecord {
    #[serde(default)]
    pub boat: Option<BoatRecord>,
    pub position: PositionRecord,
}

/// Response of `GET /maps/{id}/with-boats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapWithBoatsRecord {
    pub map: MapRecord,
    #[serde(default)]
    pub boats: Vec<BoatWithPositionRecord>,
}

/// Body of `POST /positions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPosition {
    pub map_id: MapId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub color: String,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub is_visible: bool,
}

/// Sparse update for a placement; body of `PUT /positions/{id}`. Only present
/// fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Fill color token.
    #[serde(rename = "color", skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(rename = "stroke_color", skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(rename = "is_visible", skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl PlacementPatch {
    /// Patch that moves the top-left corner.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    /// Patch carrying every mutable field of `placement`.
    #[must_use]
    pub fn snapshot(placement: &Placement) -> Self {
        let g = placement.geometry;
        Self {
            x: Some(g.x),
            y: Some(g.y),
            width: Some(g.width),
            height: Some(g.height),
            rotation: Some(g.rotation),
            fill: Some(placement.style.fill.clone()),
            stroke: Some(placement.style.stroke.clone()),
            stroke_width: Some(placement.style.stroke_width),
            visible: Some(placement.visible),
        }
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the present fields to `geometry`.
    #[must_use]
    pub fn apply_geometry(&self, geometry: Geometry) -> Geometry {
        Geometry {
            x: self.x.unwrap_or(geometry.x),
            y: self.y.unwrap_or(geometry.y),
            width: self.width.unwrap_or(geometry.width),
            height: self.height.unwrap_or(geometry.height),
            rotation: self.rotation.unwrap_or(geometry.rotation),
        }
    }
}

fn default_true() -> bool {
    true
}

// =============================================================
// Session types
// =============================================================

/// The map currently being edited. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    pub id: MapId,
    pub name: String,
    /// Background image reference, relative to the asset root.
    pub image_path: String,
    pub image_width: u32,
    pub image_height: u32,
}

impl MapDocument {
    /// Raster size in image pixels.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.image_width), f64::from(self.image_height))
    }

    /// Center of the raster in image space.
    #[must_use]
    pub fn center(&self) -> Point {
        let size = self.size();
        Point::new(size.width * 0.5, size.height * 0.5)
    }
}

impl From<MapRecord> for MapDocument {
    fn from(record: MapRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            image_path: record.image_path,
            image_width: record.image_width,
            image_height: record.image_height,
        }
    }
}

/// Placement box in image space. `x`/`y` is the top-left corner; rotation is
/// clockwise degrees about the box center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

impl Geometry {
    /// A box of the given size whose center is `center`.
    #[must_use]
    pub fn centered_at(center: Point, width: f64, height: f64) -> Self {
        Self { x: center.x - width * 0.5, y: center.y - height * 0.5, width, height, rotation: 0.0 }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Keep the top-left corner inside `bounds`, the size at or above `floor`,
    /// and rotation within (-360, 360).
    ///
    /// Non-finite values collapse to the nearest legal value.
    #[must_use]
    pub fn clamped(self, bounds: Size, floor: Size) -> Self {
        Self {
            x: clamp_axis(self.x, bounds.width),
            y: clamp_axis(self.y, bounds.height),
            width: floor_len(self.width, floor.width),
            height: floor_len(self.height, floor.height),
            rotation: normalize_rotation(self.rotation),
        }
    }
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.min(max.max(0.0)).max(0.0)
}

fn floor_len(value: f64, floor: f64) -> f64 {
    if value.is_finite() && value >= floor { value } else { floor }
}

/// Fold rotation into (-360, 360) with a truncated remainder so the sign is kept.
#[must_use]
pub fn normalize_rotation(rotation: f64) -> f64 {
    if rotation.is_finite() { rotation % 360.0 } else { 0.0 }
}

/// Visual attributes of a placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

/// A positioned, sized, rotated marker on the current map.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: PlacementId,
    pub map_id: MapId,
    pub geometry: Geometry,
    pub style: Style,
    pub visible: bool,
}

impl Placement {
    /// Apply the non-geometry fields of `patch`. Geometry goes through the
    /// store so it can be clamped.
    pub fn apply_style(&mut self, patch: &PlacementPatch) {
        if let Some(fill) = &patch.fill {
            self.style.fill.clone_from(fill);
        }
        if let Some(stroke) = &patch.stroke {
            self.style.stroke.clone_from(stroke);
        }
        if let Some(w) = patch.stroke_width {
            self.style.stroke_width = w;
        }
        if let Some(v) = patch.visible {
            self.visible = v;
        }
    }

    /// Body for creating this placement on the server.
    #[must_use]
    pub fn to_new_position(&self) -> NewPosition {
        NewPosition {
            map_id: self.map_id,
            x: self.geometry.x,
            y: self.geometry.y,
            width: self.geometry.width,
            height: self.geometry.height,
            rotation: self.geometry.rotation,
            color: self.style.fill.clone(),
            stroke_color: self.style.stroke.clone(),
            stroke_width: self.style.stroke_width,
            is_visible: self.visible,
        }
    }
}

impl From<PositionRecord> for Placement {
    fn from(record: PositionRecord) -> Self {
        Self {
            id: PlacementId::Server(record.id),
            map_id: record.map_id,
            geometry: Geometry {
                x: record.x,
                y: record.y,
                width: record.width,
                height: record.height,
                rotation: record.rotation,
            },
            style: Style { fill: record.color, stroke: record.stroke_color, stroke_width: record.stroke_width },
            visible: record.is_visible,
        }
    }
}

/// The boat attached to a placement. The core reads only identity and label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityBinding {
    pub id: BoatId,
    pub label: String,
}

impl From<&BoatRecord> for EntityBinding {
    fn from(record: &BoatRecord) -> Self {
        let label = match record.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => format!("#{}", record.index),
        };
        Self { id: record.id, label }
    }
}

/// A placement plus the boat bound to it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementWithBinding {
    pub placement: Placement,
    pub binding: Option<EntityBinding>,
}

impl PlacementWithBinding {
    #[must_use]
    pub fn id(&self) -> PlacementId {
        self.placement.id
    }

    /// Display label: the boat label, or `Position #<id>` for unbound markers.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.binding {
            Some(binding) => binding.label.clone(),
            None => format!("Position #{}", self.placement.id),
        }
    }
}

impl From<BoatWithPositionRecord> for PlacementWithBinding {
    fn from(record: BoatWithPositionRecord) -> Self {
        Self {
            binding: record.boat.as_ref().map(EntityBinding::from),
            placement: Placement::from(record.position),
        }
    }
}
