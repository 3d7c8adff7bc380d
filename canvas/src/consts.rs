//! Shared numeric and style constants for the canvas crate.

// ── Placement defaults ──────────────────────────────────────────

/// Width of a newly added placement, in image pixels.
pub const DEFAULT_BOAT_WIDTH: f64 = 100.0;

/// Height of a newly added placement, in image pixels.
pub const DEFAULT_BOAT_HEIGHT: f64 = 50.0;

/// Fill color token for new placements.
pub const DEFAULT_FILL: &str = "blue";

/// Stroke color token for new placements.
pub const DEFAULT_STROKE: &str = "black";

/// Stroke width for new placements.
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;

/// Smallest width a placement may be resized to.
pub const MIN_BOAT_WIDTH: f64 = 10.0;

/// Smallest height a placement may be resized to.
pub const MIN_BOAT_HEIGHT: f64 = 7.0;

// ── Keyboard nudges ─────────────────────────────────────────────

/// Move step per keystroke, in image pixels.
pub const NUDGE_STEP: f64 = 5.0;

/// Rotation step per keystroke, in degrees.
pub const ROTATE_STEP_DEG: f64 = 5.0;

/// Width change per resize keystroke.
pub const RESIZE_STEP_W: f64 = 5.0;

/// Height change per resize keystroke (keeps the default 2:1 hull ratio roughly intact).
pub const RESIZE_STEP_H: f64 = 3.5;

// ── Zoom ────────────────────────────────────────────────────────

pub const ZOOM_MIN: f64 = 0.1;
pub const ZOOM_MAX: f64 = 3.0;

/// Multiplicative factor for one zoom-in / zoom-out click.
pub const ZOOM_STEP: f64 = 1.2;

// ── Pointer ─────────────────────────────────────────────────────

/// Distance in viewport pixels the pointer must travel before a press becomes a drag.
pub const DRAG_SLOP_PX: f64 = 3.0;

/// Extra hit radius around a placement, in viewport pixels.
pub const HIT_SLOP_PX: f64 = 2.0;

/// Viewport size assumed until the host reports one.
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 800.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 600.0;

// ── Rendering ───────────────────────────────────────────────────

/// Fill used for the selected placement.
pub const SELECTED_FILL: &str = "#3B82F6";

/// Fill used for placements with no boat bound.
pub const UNBOUND_FILL: &str = "#9CA3AF";

pub const SELECTED_STROKE_WIDTH: f64 = 3.0;
pub const DRAGGING_STROKE_WIDTH: f64 = 2.0;

/// Opacity of a placement whose visibility flag is off.
pub const HIDDEN_OPACITY: f64 = 0.3;

/// Opacity of the placement being dragged.
pub const DRAGGING_OPACITY: f64 = 0.8;

/// Padding of the dashed selection halo around the selected placement, in image pixels.
pub const SELECTION_HALO_PAD: f64 = 10.0;

/// Upper bound on label font size, in image pixels.
pub const LABEL_MAX_FONT: f64 = 14.0;
