//! Input model: the selection state machine, zoom, keyboard commands, and the
//! transient pointer gesture.
//!
//! `InteractionState` is what the rest of the session sees: which placement is
//! selected, whether it is being dragged, whether the canvas accepts input at
//! all, and the user's zoom. `Gesture` is the pointer bookkeeping the engine
//! keeps between pointer-down and pointer-up. `KeyCommand` maps key names to
//! fixed-delta edits of the selected placement.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::config::EditorConfig;
use crate::doc::{Geometry, PlacementId, PlacementPatch};
use crate::error::InteractionError;
use crate::store::PositionStore;

/// Selection state of the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interaction {
    /// Nothing selected.
    #[default]
    Idle,
    /// One placement selected; keyboard commands apply to it.
    Selected(PlacementId),
    /// The selected placement is following the pointer.
    Dragging(PlacementId),
}

/// Session-scoped interaction state. One instance per editor.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionState {
    state: Interaction,
    interactive: bool,
    zoom: f64,
    zoom_min: f64,
    zoom_max: f64,
    zoom_step: f64,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl InteractionState {
    #[must_use]
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            state: Interaction::Idle,
            interactive: true,
            zoom: config.clamp_zoom(1.0),
            zoom_min: config.zoom_min,
            zoom_max: config.zoom_max,
            zoom_step: config.zoom_step,
        }
    }

    #[must_use]
    pub fn state(&self) -> Interaction {
        self.state
    }

    /// The selected placement, including one being dragged.
    #[must_use]
    pub fn selected(&self) -> Option<PlacementId> {
        match self.state {
            Interaction::Idle => None,
            Interaction::Selected(id) | Interaction::Dragging(id) => Some(id),
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, Interaction::Dragging(_))
    }

    /// Select `id`. An id the store does not hold clears the selection.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::UnknownPlacement`] if `id` is not in `store`.
    pub fn select(&mut self, id: PlacementId, store: &PositionStore) -> Result<(), InteractionError> {
        if store.contains(id) {
            self.state = Interaction::Selected(id);
            Ok(())
        } else {
            self.state = Interaction::Idle;
            Err(InteractionError::UnknownPlacement(id))
        }
    }

    /// Drop the selection. Returns `true` if something was selected.
    pub fn clear(&mut self) -> bool {
        let had = self.state != Interaction::Idle;
        self.state = Interaction::Idle;
        had
    }

    /// `Selected` → `Dragging`. Returns `false` from any other state.
    pub fn begin_drag(&mut self) -> bool {
        match self.state {
            Interaction::Selected(id) => {
                self.state = Interaction::Dragging(id);
                true
            }
            _ => false,
        }
    }

    /// `Dragging` → `Selected`, returning the dragged id.
    pub fn end_drag(&mut self) -> Option<PlacementId> {
        match self.state {
            Interaction::Dragging(id) => {
                self.state = Interaction::Selected(id);
                Some(id)
            }
            _ => None,
        }
    }

    /// A placement left the store; drop it from the selection.
    pub fn on_removed(&mut self, id: PlacementId) {
        if self.selected() == Some(id) {
            self.state = Interaction::Idle;
        }
    }

    /// A pending placement was confirmed under a server id.
    pub fn remap(&mut self, from: PlacementId, to: PlacementId) {
        self.state = match self.state {
            Interaction::Selected(id) if id == from => Interaction::Selected(to),
            Interaction::Dragging(id) if id == from => Interaction::Dragging(to),
            other => other,
        };
    }

    /// Clear the selection if it no longer refers to a placement in `store`.
    /// Returns `true` if the selection was dropped.
    pub fn retain(&mut self, store: &PositionStore) -> bool {
        match self.selected() {
            Some(id) if !store.contains(id) => {
                self.state = Interaction::Idle;
                true
            }
            _ => false,
        }
    }

    // --- Input enable ---

    #[must_use]
    pub fn interactive(&self) -> bool {
        self.interactive
    }

    /// Enable or disable canvas input. Disabling ends a drag in progress.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
        if !interactive {
            self.end_drag();
        }
    }

    // --- Zoom ---

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom, clamped to the configured range. Returns `true` if it changed.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let next = if zoom.is_nan() { 1.0 } else { zoom }.max(self.zoom_min).min(self.zoom_max);
        let changed = (next - self.zoom).abs() > f64::EPSILON;
        self.zoom = next;
        changed
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom * self.zoom_step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom / self.zoom_step)
    }

    pub fn reset_zoom(&mut self) -> bool {
        self.set_zoom(1.0)
    }
}

/// Pointer bookkeeping between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    /// No button held.
    #[default]
    Idle,
    /// Button held on a placement; not yet moved past the drag slop.
    Pressed {
        id: PlacementId,
        /// Viewport position of the press.
        start: Point,
        /// Pointer offset from the placement's top-left, image space.
        grab: Point,
    },
    /// Button held and the placement follows the pointer.
    Dragging { id: PlacementId, grab: Point },
}

impl Gesture {
    #[must_use]
    pub fn id(&self) -> Option<PlacementId> {
        match *self {
            Self::Idle => None,
            Self::Pressed { id, .. } | Self::Dragging { id, .. } => Some(id),
        }
    }

    pub fn remap(&mut self, from: PlacementId, to: PlacementId) {
        match self {
            Self::Pressed { id, .. } | Self::Dragging { id, .. } if *id == from => *id = to,
            _ => {}
        }
    }
}

/// A keyboard command on the selected placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    RotateLeft,
    RotateRight,
    Grow,
    Shrink,
    ClearSelection,
    Delete,
}

impl KeyCommand {
    /// Map a key name (as reported by the host, e.g. `"w"`, `"ArrowUp"`) to a
    /// command. Matching ignores ASCII case.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        let cmd = match key.as_str() {
            "w" | "arrowup" => Self::MoveUp,
            "s" | "arrowdown" => Self::MoveDown,
            "a" | "arrowleft" => Self::MoveLeft,
            "d" | "arrowright" => Self::MoveRight,
            "[" => Self::RotateLeft,
            "]" => Self::RotateRight,
            "=" | "+" => Self::Grow,
            "-" => Self::Shrink,
            "escape" => Self::ClearSelection,
            "delete" | "backspace" => Self::Delete,
            _ => return None,
        };
        Some(cmd)
    }

    /// The edit this command makes to `geometry`, or `None` for commands that
    /// are not edits. The store clamps the result.
    #[must_use]
    pub fn patch(self, geometry: &Geometry, config: &EditorConfig) -> Option<PlacementPatch> {
        let step = config.nudge_step;
        let rs = config.resize_step;
        let patch = match self {
            Self::MoveUp => PlacementPatch { y: Some(geometry.y - step), ..Default::default() },
            Self::MoveDown => PlacementPatch { y: Some(geometry.y + step), ..Default::default() },
            Self::MoveLeft => PlacementPatch { x: Some(geometry.x - step), ..Default::default() },
            Self::MoveRight => PlacementPatch { x: Some(geometry.x + step), ..Default::default() },
            Self::RotateLeft => {
                PlacementPatch { rotation: Some(geometry.rotation - config.rotate_step), ..Default::default() }
            }
            Self::RotateRight => {
                PlacementPatch { rotation: Some(geometry.rotation + config.rotate_step), ..Default::default() }
            }
            Self::Grow => PlacementPatch {
                width: Some(geometry.width + rs.width),
                height: Some(geometry.height + rs.height),
                ..Default::default()
            },
            Self::Shrink => PlacementPatch {
                width: Some((geometry.width - rs.width).max(config.min_size.width)),
                height: Some((geometry.height - rs.height).max(config.min_size.height)),
                ..Default::default()
            },
            Self::ClearSelection | Self::Delete => return None,
        };
        Some(patch)
    }
}
