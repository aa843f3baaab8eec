//! Pinhole camera and primary-ray generation.

use glam::DVec3;

use crate::ray::Ray;

/// Pinhole camera looking through a viewport in the z = 0 plane.
///
/// The default places the camera at ⟨0, 0, 1⟩ behind a 1×1 viewport centered
/// on the origin. Primary-ray directions are deliberately left unnormalized
/// (viewport point minus camera origin); intersection t values along primary
/// rays are scaled accordingly.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// Rendered image width in pixels.
    pub image_width: u32,
    /// Rendered image height in pixels.
    pub image_height: u32,
    /// Viewport width in world units.
    pub viewport_width: f64,
    /// Viewport height in world units.
    pub viewport_height: f64,
    /// Camera position in world space.
    pub origin: DVec3,
}

impl Camera {
    /// Create a camera with the default origin and 1×1 viewport.
    pub fn new(image_width: u32, image_height: u32) -> Self {
        Self {
            image_width,
            image_height,
            viewport_width: 1.0,
            viewport_height: 1.0,
            origin: DVec3::new(0.0, 0.0, 1.0),
        }
    }

    /// Generate the primary ray for pixel (i, j) jittered by (du, dv).
    ///
    /// Pixel (0, 0) maps to the bottom-left of the viewport; the jitter is
    /// uniform in [0, 1) for box-filter antialiasing.
    pub fn primary_ray(&self, i: u32, j: u32, du: f64, dv: f64) -> Ray {
        let width = self.image_width as f64;
        let height = self.image_height as f64;
        let target = DVec3::new(
            (i as f64 + du - 0.5 - width / 2.0) * (self.viewport_width / width),
            (j as f64 + dv - 0.5 - height / 2.0) * (self.viewport_height / height),
            0.0,
        );
        Ray::new(self.origin, target - self.origin)
    }
}
