//! Editor tuning: keyboard step sizes, zoom range, and the style of new placements.

use crate::camera::Size;
use crate::consts::{
    DEFAULT_BOAT_HEIGHT, DEFAULT_BOAT_WIDTH, DEFAULT_FILL, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH, DRAG_SLOP_PX,
    MIN_BOAT_HEIGHT, MIN_BOAT_WIDTH, NUDGE_STEP, RESIZE_STEP_H, RESIZE_STEP_W, ROTATE_STEP_DEG, ZOOM_MAX, ZOOM_MIN,
    ZOOM_STEP,
};
use crate::doc::Style;

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Move distance per keystroke, image pixels.
    pub nudge_step: f64,
    /// Rotation per keystroke, degrees.
    pub rotate_step: f64,
    /// Size change per resize keystroke, image pixels.
    pub resize_step: Size,
    /// Smallest allowed placement size.
    pub min_size: Size,
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub zoom_step: f64,
    /// Pointer travel, viewport pixels, before a press becomes a drag.
    pub drag_slop: f64,
    /// Size of placements created by double-click or the toolbar.
    pub default_size: Size,
    /// Style of placements created by double-click or the toolbar.
    pub default_style: Style,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            nudge_step: NUDGE_STEP,
            rotate_step: ROTATE_STEP_DEG,
            resize_step: Size::new(RESIZE_STEP_W, RESIZE_STEP_H),
            min_size: Size::new(MIN_BOAT_WIDTH, MIN_BOAT_HEIGHT),
            zoom_min: ZOOM_MIN,
            zoom_max: ZOOM_MAX,
            zoom_step: ZOOM_STEP,
            drag_slop: DRAG_SLOP_PX,
            default_size: Size::new(DEFAULT_BOAT_WIDTH, DEFAULT_BOAT_HEIGHT),
            default_style: Style {
                fill: DEFAULT_FILL.to_owned(),
                stroke: DEFAULT_STROKE.to_owned(),
                stroke_width: DEFAULT_STROKE_WIDTH,
            },
        }
    }
}

impl EditorConfig {
    /// Clamp a zoom factor into the configured range.
    #[must_use]
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return 1.0_f64.max(self.zoom_min).min(self.zoom_max);
        }
        zoom.max(self.zoom_min).min(self.zoom_max)
    }
}
