//! Rendering: builds the display list the host draws.
//!
//! [`scene`] receives read-only views of the store, interaction state and
//! viewport and produces a [`Scene`] in viewport pixels. It does not mutate
//! any state and performs no drawing itself; the host walks the list in order
//! (background, sprites bottom-first, overlay, toolbar).

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use serde::Serialize;

use crate::camera::{Camera, Point, Size};
use crate::config::EditorConfig;
use crate::consts::{
    DRAGGING_OPACITY, DRAGGING_STROKE_WIDTH, HIDDEN_OPACITY, LABEL_MAX_FONT, SELECTED_FILL, SELECTED_STROKE_WIDTH,
    SELECTION_HALO_PAD, UNBOUND_FILL,
};
use crate::doc::{PlacementId, PlacementWithBinding};
use crate::input::{Interaction, InteractionState};
use crate::store::PositionStore;

/// Asset directory map images are served from.
const MAP_ASSET_ROOT: &str = "/assets/maps";

/// Label text color.
const LABEL_FILL: &str = "white";

/// Selection halo stroke width and dash pattern, image pixels.
const HALO_STROKE_WIDTH: f64 = 2.0;
const HALO_DASH: [f64; 2] = [5.0, 5.0];

/// Shadow blur under the selected placement.
const SELECTED_SHADOW_BLUR: f64 = 10.0;

const MOVE_HINT: &str = "Use WASD or arrow keys to move selected boat";
const KEY_HELP: [&str; 3] = ["WASD: Move", "[] : Rotate", "+/-: Resize"];

/// Everything the host needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub viewport: Size,
    /// Effective image → viewport scale.
    pub scale: f64,
    pub background: Option<Background>,
    /// Placements in draw order (bottom first).
    pub sprites: Vec<BoatSprite>,
    pub overlay: Option<StatusOverlay>,
    pub toolbar: Toolbar,
}

/// The map raster, scaled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Background {
    pub image_url: String,
    pub origin: Point,
    pub size: Size,
}

/// One placement, resolved to viewport pixels and final style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoatSprite {
    pub id: PlacementId,
    pub center: Point,
    pub size: Size,
    /// Clockwise degrees about `center`.
    pub rotation: f64,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub opacity: f64,
    pub shadow_blur: f64,
    pub label: Option<Label>,
    pub halo: Option<Halo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub text: String,
    pub font_size: f64,
    pub fill: String,
}

/// Dashed ring drawn around the selected placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Halo {
    pub size: Size,
    pub stroke: String,
    pub stroke_width: f64,
    pub dash: [f64; 2],
}

/// Map info box in the corner of the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusOverlay {
    pub title: String,
    pub subtitle: String,
    pub hint: Option<String>,
}

/// State of the toolbar controls.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toolbar {
    pub can_add: bool,
    pub can_delete: bool,
    pub interactive: bool,
    /// Zoom as a rounded percentage.
    pub zoom_percent: u32,
    pub can_zoom_in: bool,
    pub can_zoom_out: bool,
    /// Label of the selected placement and key help, when one is selected.
    pub selection: Option<SelectionPanel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionPanel {
    pub label: String,
    pub help: Vec<String>,
}

/// Build the display list for the current state.
#[must_use]
pub fn scene(store: &PositionStore, interaction: &InteractionState, viewport: Size, config: &EditorConfig) -> Scene {
    let Some(map) = store.map() else {
        return Scene {
            viewport,
            scale: interaction.zoom(),
            background: None,
            sprites: Vec::new(),
            overlay: None,
            toolbar: toolbar(store, interaction, config),
        };
    };

    let camera = Camera::fitted(map.size(), viewport, interaction.zoom());
    let scale = camera.scale();
    let background = Background {
        image_url: format!("{MAP_ASSET_ROOT}/{}", map.image_path),
        origin: Point::default(),
        size: Size::new(map.size().width * scale, map.size().height * scale),
    };

    let sprites = store.placements().iter().map(|entry| sprite(entry, interaction.state(), &camera)).collect();

    let overlay = StatusOverlay {
        title: map.name.clone(),
        subtitle: format!("{} positions", store.len()),
        hint: interaction.selected().map(|_| MOVE_HINT.to_owned()),
    };

    Scene {
        viewport,
        scale,
        background: Some(background),
        sprites,
        overlay: Some(overlay),
        toolbar: toolbar(store, interaction, config),
    }
}

fn sprite(entry: &PlacementWithBinding, state: Interaction, camera: &Camera) -> BoatSprite {
    let placement = &entry.placement;
    let g = placement.geometry;
    let selected = matches!(state, Interaction::Selected(id) | Interaction::Dragging(id) if id == placement.id);
    let dragging = state == Interaction::Dragging(placement.id);

    let fill = if selected {
        SELECTED_FILL.to_owned()
    } else if entry.binding.is_none() {
        UNBOUND_FILL.to_owned()
    } else {
        placement.style.fill.clone()
    };

    let stroke_width = if dragging {
        DRAGGING_STROKE_WIDTH
    } else if selected {
        SELECTED_STROKE_WIDTH
    } else {
        placement.style.stroke_width
    };

    let opacity = match (placement.visible, dragging) {
        (false, _) => HIDDEN_OPACITY,
        (true, true) => DRAGGING_OPACITY,
        (true, false) => 1.0,
    };

    // Only bound placements carry a label on the canvas.
    let label = entry.binding.as_ref().map(|b| Label {
        text: b.label.clone(),
        font_size: camera.image_len_to_viewport((g.width / 4.0).min(LABEL_MAX_FONT)),
        fill: LABEL_FILL.to_owned(),
    });

    let halo = selected.then(|| Halo {
        size: Size::new(
            camera.image_len_to_viewport(g.width + SELECTION_HALO_PAD),
            camera.image_len_to_viewport(g.height + SELECTION_HALO_PAD),
        ),
        stroke: SELECTED_FILL.to_owned(),
        stroke_width: camera.image_len_to_viewport(HALO_STROKE_WIDTH),
        dash: HALO_DASH.map(|d| camera.image_len_to_viewport(d)),
    });

    BoatSprite {
        id: placement.id,
        center: camera.image_to_viewport(g.center()),
        size: Size::new(camera.image_len_to_viewport(g.width), camera.image_len_to_viewport(g.height)),
        rotation: g.rotation,
        fill,
        stroke: placement.style.stroke.clone(),
        stroke_width: camera.image_len_to_viewport(stroke_width),
        opacity,
        shadow_blur: if selected { SELECTED_SHADOW_BLUR } else { 0.0 },
        label,
        halo,
    }
}

fn toolbar(store: &PositionStore, interaction: &InteractionState, config: &EditorConfig) -> Toolbar {
    let zoom = interaction.zoom();
    let selection = interaction.selected().and_then(|id| store.get(id)).map(|entry| SelectionPanel {
        label: entry.label(),
        help: KEY_HELP.iter().map(|s| (*s).to_owned()).collect(),
    });
    Toolbar {
        can_add: interaction.interactive() && store.map().is_some(),
        can_delete: interaction.interactive() && selection.is_some(),
        interactive: interaction.interactive(),
        zoom_percent: zoom_percent(zoom),
        can_zoom_in: zoom < config.zoom_max,
        can_zoom_out: zoom > config.zoom_min,
        selection,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn zoom_percent(zoom: f64) -> u32 {
    (zoom * 100.0).round().max(0.0) as u32
}
