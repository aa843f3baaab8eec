//! Triangle geometry and ray/triangle intersection.
//!
//! Triangles reference their vertices through stable indices into the scene's
//! vertex array, so growing the array never invalidates existing triangles.

use glam::DVec3;

use crate::bsdf::{Bsdf, Color};
use crate::ray::Ray;

/// Rejection threshold for the determinant and the hit distance.
///
/// Doubles as the parallel/degenerate test and the self-intersection guard.
pub const INTERSECT_EPSILON: f64 = 1e-5;

/// Mesh vertex with shading attributes.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    /// Position in world space.
    pub position: DVec3,
    /// Linear RGB base color, blended barycentrically at hit points.
    pub color: Color,
    /// Shading normal. Expected to be unit length; a non-unit normal renders
    /// with that approximation.
    pub normal: DVec3,
}

/// Triangle referencing three vertices by index.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// Indices of the three vertices in the scene vertex array.
    pub vertices: [u32; 3],
    /// Emitted radiance; nonzero makes the triangle a light source.
    pub emission: Color,
    /// Reflectance model applied at hit points.
    pub material: Bsdf,
}

/// Accepted ray/triangle intersection.
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Ray parameter of the hit (a distance only for unit directions).
    pub t: f64,
    /// Barycentric coordinates (u, v, 1 - u - v).
    pub barycentric: DVec3,
}

/// Möller–Trumbore ray/triangle intersection against vertex positions a, b, c.
///
/// The determinant test is one-sided: triangles whose winding puts the
/// determinant below the epsilon are rejected, which silently back-face culls
/// based on vertex order. Degenerate triangles fail the same test.
pub fn intersect(a: DVec3, b: DVec3, c: DVec3, ray: &Ray) -> Option<TriangleHit> {
    let e1 = b - a;
    let e2 = c - a;

    let h = ray.direction.cross(e2);
    let det = h.dot(e1);
    if det < INTERSECT_EPSILON {
        return None;
    }
    let f = 1.0 / det;

    let s = ray.origin - a;
    let u = f * s.dot(h);
    let q = s.cross(e1);
    let v = f * ray.direction.dot(q);
    let t = f * e2.dot(q);

    if u >= 0.0 && v >= 0.0 && u + v <= 1.0 && t > INTERSECT_EPSILON {
        Some(TriangleHit {
            t,
            barycentric: DVec3::new(u, v, 1.0 - u - v),
        })
    } else {
        None
    }
}
