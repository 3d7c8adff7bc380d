#![allow(clippy::float_cmp)]

use super::*;
use crate::consts::{ZOOM_MAX, ZOOM_MIN};

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// --- Point / Size ---

#[test]
fn point_new() {
    let p = Point::new(3.0, 4.0);
    assert_eq!(p.x, 3.0);
    assert_eq!(p.y, 4.0);
}

#[test]
fn point_distance() {
    assert!(approx_eq(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0));
}

#[test]
fn size_new() {
    let s = Size::new(800.0, 600.0);
    assert_eq!(s.width, 800.0);
    assert_eq!(s.height, 600.0);
}

// --- to_viewport / to_image ---

#[test]
fn to_viewport_scales_both_axes() {
    let v = to_viewport(Point::new(100.0, 40.0), 0.5);
    assert!(point_approx_eq(v, Point::new(50.0, 20.0)));
}

#[test]
fn to_image_inverts_scale() {
    let i = to_image(Point::new(50.0, 20.0), 0.5);
    assert!(point_approx_eq(i, Point::new(100.0, 40.0)));
}

#[test]
fn negative_points_pass_through_unclamped() {
    let v = to_viewport(Point::new(-20.0, 5000.0), 2.0);
    assert!(point_approx_eq(v, Point::new(-40.0, 10000.0)));
}

#[test]
fn round_trip_across_zoom_range() {
    let points = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(123.456, 789.012),
        Point::new(799.9, 599.9),
        Point::new(-15.5, 42.25),
    ];
    let steps = 30;
    for i in 0..=steps {
        let s = ZOOM_MIN + (ZOOM_MAX - ZOOM_MIN) * f64::from(i) / f64::from(steps);
        for p in points {
            let back = to_image(to_viewport(p, s), s);
            assert!(point_approx_eq(back, p), "round trip failed at scale {s} for {p:?}");
        }
    }
}

// --- fit_scale ---

#[test]
fn fit_scale_halves_800x600_into_400x300() {
    assert!(approx_eq(fit_scale(Size::new(800.0, 600.0), Size::new(400.0, 300.0)), 0.5));
}

#[test]
fn fit_scale_never_upscales() {
    assert_eq!(fit_scale(Size::new(200.0, 100.0), Size::new(2000.0, 1000.0)), 1.0);
}

#[test]
fn fit_scale_picks_tighter_axis() {
    // Width ratio 0.5, height ratio 0.25.
    let s = fit_scale(Size::new(800.0, 800.0), Size::new(400.0, 200.0));
    assert!(approx_eq(s, 0.25));
}

#[test]
fn fit_scale_bounded_by_both_ratios() {
    let cases = [
        (Size::new(794.0, 1123.0), Size::new(1200.0, 700.0)),
        (Size::new(3000.0, 1000.0), Size::new(640.0, 480.0)),
        (Size::new(10.0, 10.0), Size::new(5.0, 100.0)),
    ];
    for (image, viewport) in cases {
        let s = fit_scale(image, viewport);
        assert!(s <= 1.0);
        assert!(s <= viewport.width / image.width + EPSILON);
        assert!(s <= viewport.height / image.height + EPSILON);
    }
}

// --- Camera ---

#[test]
fn camera_default_is_identity() {
    let cam = Camera::default();
    assert_eq!(cam.scale(), 1.0);
    assert!(point_approx_eq(cam.image_to_viewport(Point::new(7.0, 9.0)), Point::new(7.0, 9.0)));
}

#[test]
fn camera_scenario_placement_renders_at_half() {
    let cam = Camera::fitted(Size::new(800.0, 600.0), Size::new(400.0, 300.0), 1.0);
    let v = cam.image_to_viewport(Point::new(100.0, 100.0));
    assert!(point_approx_eq(v, Point::new(50.0, 50.0)));
}

#[test]
fn camera_zoom_multiplies_fit() {
    let cam = Camera::fitted(Size::new(800.0, 600.0), Size::new(400.0, 300.0), 2.0);
    assert!(approx_eq(cam.scale(), 1.0));
}

#[test]
fn camera_viewport_to_image_round_trip() {
    let cam = Camera { fit: 0.37, zoom: 1.7 };
    let p = Point::new(311.0, 47.5);
    assert!(point_approx_eq(cam.viewport_to_image(cam.image_to_viewport(p)), p));
}

#[test]
fn camera_length_conversions_are_inverse() {
    let cam = Camera { fit: 0.5, zoom: 2.5 };
    assert!(approx_eq(cam.viewport_len_to_image(cam.image_len_to_viewport(12.0)), 12.0));
    assert!(approx_eq(cam.viewport_len_to_image(10.0), 8.0));
}
