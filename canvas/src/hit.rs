//! Hit-testing: which placement, if any, lies under a pointer position.
//!
//! Placements are drawn as ellipses inscribed in their boxes and rotated about
//! the box center, so that is the shape tested here. Later placements draw on
//! top of earlier ones and win.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point};
use crate::consts::HIT_SLOP_PX;
use crate::doc::{Geometry, PlacementId, PlacementWithBinding};

/// Whether image-space `pt` lies inside the rotated ellipse of `geometry`,
/// grown by `slop` image pixels on each radius.
#[must_use]
pub fn contains(geometry: &Geometry, pt: Point, slop: f64) -> bool {
    let center = geometry.center();
    let (sin, cos) = (-geometry.rotation.to_radians()).sin_cos();
    let dx = pt.x - center.x;
    let dy = pt.y - center.y;
    let lx = dx * cos - dy * sin;
    let ly = dx * sin + dy * cos;

    let rx = geometry.width * 0.5 + slop;
    let ry = geometry.height * 0.5 + slop;
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    (lx / rx).powi(2) + (ly / ry).powi(2) <= 1.0
}

/// Topmost placement under image-space `pt`. The hit slop is a fixed number of
/// viewport pixels, so it shrinks in image space as the user zooms in.
#[must_use]
pub fn hit_test(placements: &[PlacementWithBinding], pt: Point, camera: &Camera) -> Option<PlacementId> {
    let slop = camera.viewport_len_to_image(HIT_SLOP_PX);
    let slop = if slop.is_finite() { slop } else { 0.0 };
    placements.iter().rev().find(|p| contains(&p.placement.geometry, pt, slop)).map(PlacementWithBinding::id)
}
