//! Image-space ↔ viewport-space transforms.
//!
//! Image space is the source raster's pixel grid. Viewport space is what the
//! host draws after scaling. Nothing here clamps: out-of-range points pass
//! straight through, and keeping placements on the map is the store's job.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::Serialize;

/// A point in either image or viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A width/height pair in either space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Convert an image-space point to viewport space at `scale`.
#[must_use]
pub fn to_viewport(image: Point, scale: f64) -> Point {
    Point { x: image.x * scale, y: image.y * scale }
}

/// Convert a viewport-space point back to image space at `scale`.
#[must_use]
pub fn to_image(viewport: Point, scale: f64) -> Point {
    Point { x: viewport.x / scale, y: viewport.y / scale }
}

/// Largest scale at which the whole image fits the viewport, never above 1.0.
#[must_use]
pub fn fit_scale(image: Size, viewport: Size) -> f64 {
    let sx = viewport.width / image.width;
    let sy = viewport.height / image.height;
    sx.min(sy).min(1.0)
}

/// Effective view transform: the fit scale for the current map and viewport,
/// multiplied by the user's zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fit: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { fit: 1.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Camera for an image shown in a viewport at the given zoom.
    #[must_use]
    pub fn fitted(image: Size, viewport: Size, zoom: f64) -> Self {
        Self { fit: fit_scale(image, viewport), zoom }
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.fit * self.zoom
    }

    #[must_use]
    pub fn image_to_viewport(&self, image: Point) -> Point {
        to_viewport(image, self.scale())
    }

    #[must_use]
    pub fn viewport_to_image(&self, viewport: Point) -> Point {
        to_image(viewport, self.scale())
    }

    /// Convert a viewport-space length (pixels) to an image-space length.
    #[must_use]
    pub fn viewport_len_to_image(&self, len: f64) -> f64 {
        len / self.scale()
    }

    /// Convert an image-space length to a viewport-space length.
    #[must_use]
    pub fn image_len_to_viewport(&self, len: f64) -> f64 {
        len * self.scale()
    }
}
