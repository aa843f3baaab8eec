//! Scene storage and nearest-hit queries.
//!
//! The scene owns the vertex array, the triangle list, and the emissive
//! subset used for direct-light sampling. It is built once at startup and
//! then shared read-only across all pixel workers; intersection is a linear
//! scan over every triangle.

use glam::DVec3;

use crate::bsdf::Color;
use crate::ray::Ray;
use crate::triangle::{self, Triangle, TriangleHit, Vertex};

/// Ray/scene intersection record.
///
/// Only produced for an actual hit; a miss is `None` from
/// [`Scene::intersect`].
#[derive(Debug, Clone, Copy)]
pub struct Intersection {
    /// World-space hit position.
    pub point: DVec3,
    /// Shading normal: the hit triangle's first vertex normal (flat shading).
    pub normal: DVec3,
    /// Vertex colors blended with the hit's barycentric coordinates.
    pub base_color: Color,
    /// The ray that produced this hit.
    pub ray: Ray,
    /// Index of the hit triangle in the scene triangle list.
    pub triangle: u32,
    /// Whether the back side was struck. Winding-based culling in the
    /// intersection test means front hits only.
    pub backface: bool,
}

/// Triangle soup plus the emissive subset.
#[derive(Debug, Default)]
pub struct Scene {
    /// Shared vertex storage; triangles reference it by index.
    pub vertices: Vec<Vertex>,
    /// Every triangle in the scene, in load order.
    pub triangles: Vec<Triangle>,
    /// Indices into `triangles` for every triangle with nonzero emission.
    pub lights: Vec<u32>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a triangle, registering it as a light if it emits.
    pub fn push_triangle(&mut self, tri: Triangle) {
        if tri.emission.length_squared() > 0.0 {
            self.lights.push(self.triangles.len() as u32);
        }
        self.triangles.push(tri);
    }

    /// Resolve a triangle's vertex positions.
    pub fn positions(&self, tri: &Triangle) -> (DVec3, DVec3, DVec3) {
        let [a, b, c] = tri.vertices;
        (
            self.vertices[a as usize].position,
            self.vertices[b as usize].position,
            self.vertices[c as usize].position,
        )
    }

    /// Intersect a single triangle of this scene.
    pub fn triangle_hit(&self, tri: &Triangle, ray: &Ray) -> Option<TriangleHit> {
        let (a, b, c) = self.positions(tri);
        triangle::intersect(a, b, c, ray)
    }

    /// Nearest hit along `ray` with t below `max_t`, or `None`.
    ///
    /// Linear scan over all triangles keeping the smallest accepted t.
    pub fn intersect(&self, ray: &Ray, max_t: f64) -> Option<Intersection> {
        let mut min_t = f64::MAX;
        let mut closest = None;

        for (index, tri) in self.triangles.iter().enumerate() {
            if let Some(hit) = self.triangle_hit(tri, ray) {
                if hit.t < min_t && hit.t < max_t {
                    min_t = hit.t;

                    let [ia, ib, ic] = tri.vertices;
                    let va = &self.vertices[ia as usize];
                    let vb = &self.vertices[ib as usize];
                    let vc = &self.vertices[ic as usize];
                    let bary = hit.barycentric;

                    closest = Some(Intersection {
                        point: ray.at(hit.t),
                        normal: va.normal,
                        base_color: va.color * bary.x + vb.color * bary.y + vc.color * bary.z,
                        ray: *ray,
                        triangle: index as u32,
                        backface: false,
                    });
                }
            }
        }

        closest
    }
}
