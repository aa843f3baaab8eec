//! Path integration with multiple importance sampling.
//!
//! Each path vertex combines two estimators: next-event estimation toward
//! the emissive triangles and BSDF importance sampling, weighted against
//! each other with the power heuristic. The mirror BSDF reports pdf = 1 for
//! its deterministic reflection, so mirror paths fall out of the same
//! algebra with a finite (slightly biased) weight instead of a delta term.

use glam::DVec3;

use crate::bsdf::{Bsdf, Color};
use crate::frame;
use crate::ray::Ray;
use crate::sampler::Sampler;
use crate::scene::{Intersection, Scene};

/// Offset applied along the surface normal when spawning secondary and
/// shadow rays, to keep them from re-hitting their own surface.
pub const NORMAL_OFFSET: f64 = 0.0001;

/// Shadow rays accept occluders only below this fraction of the distance to
/// the sampled light point, so the light triangle itself never occludes.
const SHADOW_T_SCALE: f64 = 0.99999;

/// Power heuristic with beta = 2.
///
/// Returns the weight for the `pdf_a` strategy; zero when both densities
/// vanish.
pub fn power_heuristic(pdf_a: f64, pdf_b: f64) -> f64 {
    let a2 = pdf_a * pdf_a;
    let b2 = pdf_b * pdf_b;
    if a2 + b2 == 0.0 {
        0.0
    } else {
        a2 / (a2 + b2)
    }
}

/// Estimate direct illumination at `isect` by sampling one emissive triangle.
///
/// `wo` is the local-frame direction toward the previous path segment (the
/// viewer side of the BSDF). Returns the weighted contribution together with
/// the light's solid-angle pdf for the MIS weight; both are zero whenever
/// the sample is occluded, the light faces away, the surface faces away, or
/// the scene has no emissive triangles at all.
pub fn next_event_estimation(
    scene: &Scene,
    wo: DVec3,
    isect: &Intersection,
    material: Bsdf,
    sampler: &mut Sampler,
) -> (Color, f64) {
    if scene.lights.is_empty() {
        return (Color::ZERO, 0.0);
    }

    let count = scene.lights.len();
    let index = ((sampler.get_1d() * count as f64) as usize).min(count - 1);
    let light = &scene.triangles[scene.lights[index] as usize];
    let (la, lb, lc) = scene.positions(light);

    // Uniform point on the light via the square-root barycentric warp.
    let u = sampler.get_1d().sqrt();
    let v = sampler.get_1d();
    let p = (1.0 - u) * la + u * (1.0 - v) * lb + u * v * lc;

    let n = isect.normal;
    let to_light = p - isect.point;
    let wi = to_light.normalize();
    let shadow_ray = Ray::new(isect.point + n * NORMAL_OFFSET, wi);

    // Distance to the sampled point, measured on the light triangle alone.
    let Some(light_hit) = scene.triangle_hit(light, &shadow_ray) else {
        return (Color::ZERO, 0.0);
    };
    if scene
        .intersect(&shadow_ray, light_hit.t * SHADOW_T_SCALE)
        .is_some()
    {
        return (Color::ZERO, 0.0);
    }

    let light_normal = scene.vertices[light.vertices[0] as usize].normal;
    let cos_light = light_normal.dot(-wi);
    let cos_surface = n.dot(wi);
    if cos_light <= 0.0 || cos_surface <= 0.0 {
        return (Color::ZERO, 0.0);
    }

    let distance_sq = to_light.length_squared();
    let g = cos_light * cos_surface / distance_sq;
    let area = 0.5 * (lb - la).cross(lc - la).length();
    let light_pdf = distance_sq / (count as f64 * cos_light * area);

    let f = material.f(frame::to_local(n.normalize(), wi), wo, isect.base_color);
    (f * light.emission * g / light_pdf, light_pdf)
}

/// Iterative path tracer combining NEE and BSDF sampling with MIS.
#[derive(Debug, Clone, Copy)]
pub struct PathIntegrator {
    /// Maximum number of scattering events along one path.
    pub max_depth: u32,
}

impl Default for PathIntegrator {
    fn default() -> Self {
        Self { max_depth: 6 }
    }
}

impl PathIntegrator {
    /// Create an integrator with the given path depth bound.
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }

    /// Estimate the radiance arriving along `ray`.
    pub fn li(&self, scene: &Scene, mut ray: Ray, sampler: &mut Sampler) -> Color {
        let mut radiance = Color::ZERO;
        let mut beta = Color::ONE;

        for _depth in 0..self.max_depth {
            let Some(isect) = scene.intersect(&ray, f64::MAX) else {
                break;
            };
            let tri = &scene.triangles[isect.triangle as usize];
            let n_unit = isect.normal.normalize();
            let wi = frame::to_local(n_unit, -ray.direction);

            let (nee, light_pdf) =
                next_event_estimation(scene, wi, &isect, tri.material, sampler);

            let sample = tri.material.sample_f(wi, isect.base_color, sampler);
            if sample.pdf <= 0.0 {
                break;
            }

            let w_nee = power_heuristic(light_pdf, sample.pdf);
            let w_bsdf = power_heuristic(sample.pdf, light_pdf);

            ray = Ray::new(
                isect.point + isect.normal * NORMAL_OFFSET,
                frame::to_world(n_unit, sample.wo),
            );

            radiance += beta * nee * w_nee;
            beta *= sample.f * sample.wo.z.abs() / sample.pdf;
            radiance += beta * tri.emission * w_bsdf;
        }

        radiance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangle::{Triangle, Vertex};
    use approx::assert_relative_eq;

    fn push_triangle(
        scene: &mut Scene,
        positions: [DVec3; 3],
        normal: DVec3,
        color: Color,
        emission: Color,
        material: Bsdf,
    ) {
        let base = scene.vertices.len() as u32;
        for position in positions {
            scene.vertices.push(Vertex {
                position,
                color,
                normal,
            });
        }
        scene.push_triangle(Triangle {
            vertices: [base, base + 1, base + 2],
            emission,
            material,
        });
    }

    /// Large triangle in the z = -1 plane facing +Z, covering the view.
    fn floor_positions() -> [DVec3; 3] {
        [
            DVec3::new(-5.0, -5.0, -1.0),
            DVec3::new(5.0, -5.0, -1.0),
            DVec3::new(0.0, 5.0, -1.0),
        ]
    }

    #[test]
    fn power_heuristic_properties() {
        assert_eq!(power_heuristic(0.0, 0.0), 0.0);
        assert_eq!(power_heuristic(0.7, 0.0), 1.0);
        assert_eq!(power_heuristic(0.0, 0.7), 0.0);

        for (a, b) in [(0.3, 0.8), (2.0, 0.01), (1.0, 1.0)] {
            let w_a = power_heuristic(a, b);
            let w_b = power_heuristic(b, a);
            assert!((0.0..=1.0).contains(&w_a));
            assert!((0.0..=1.0).contains(&w_b));
            assert_relative_eq!(w_a + w_b, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn empty_scene_yields_zero() {
        let scene = Scene::new();
        let mut sampler = Sampler::new(0);
        let ray = Ray::new(DVec3::new(0.0, 0.0, 1.0), DVec3::new(0.0, 0.0, -1.0));
        let li = PathIntegrator::default().li(&scene, ray, &mut sampler);
        assert_eq!(li, Color::ZERO);
    }

    #[test]
    fn nee_without_lights_is_zero_with_zero_pdf() {
        let mut scene = Scene::new();
        push_triangle(
            &mut scene,
            floor_positions(),
            DVec3::Z,
            Color::ONE,
            Color::ZERO,
            Bsdf::Diffuse,
        );
        let ray = Ray::new(DVec3::new(0.0, 0.0, 1.0), DVec3::new(0.0, 0.0, -1.0));
        let isect = scene.intersect(&ray, f64::MAX).expect("must hit");
        let mut sampler = Sampler::new(0);
        let (contribution, light_pdf) =
            next_event_estimation(&scene, DVec3::Z, &isect, Bsdf::Diffuse, &mut sampler);
        assert_eq!(contribution, Color::ZERO);
        assert_eq!(light_pdf, 0.0);
    }

    #[test]
    fn black_scene_renders_black() {
        // All-black diffuse surface, no emission anywhere.
        let mut scene = Scene::new();
        push_triangle(
            &mut scene,
            floor_positions(),
            DVec3::Z,
            Color::ZERO,
            Color::ZERO,
            Bsdf::Diffuse,
        );
        let integrator = PathIntegrator::default();
        let mut sampler = Sampler::new(11);
        for _ in 0..32 {
            let ray = Ray::new(DVec3::new(0.0, 0.0, 1.0), DVec3::new(0.0, 0.0, -1.0));
            assert_eq!(integrator.li(&scene, ray, &mut sampler), Color::ZERO);
        }
    }

    #[test]
    fn directly_visible_emitter_returns_its_emission() {
        // A white diffuse emitter filling the view. NEE from a point on the
        // emitter toward the emitter itself is rejected by the facing
        // checks, so the whole estimate rides the BSDF branch with weight 1.
        let emission = Color::new(300.0, 300.0, 180.0);
        let mut scene = Scene::new();
        push_triangle(
            &mut scene,
            floor_positions(),
            DVec3::Z,
            Color::ONE,
            emission,
            Bsdf::Diffuse,
        );
        let mut sampler = Sampler::new(5);
        let ray = Ray::new(DVec3::new(0.0, 0.0, 1.0), DVec3::new(0.0, 0.0, -1.0));
        let li = PathIntegrator::new(1).li(&scene, ray, &mut sampler);
        assert_relative_eq!(li.x, emission.x, epsilon = 1e-9);
        assert_relative_eq!(li.y, emission.y, epsilon = 1e-9);
        assert_relative_eq!(li.z, emission.z, epsilon = 1e-9);
    }

    #[test]
    fn mirror_bounces_reach_an_offset_light() {
        // Mirror floor at z = -1 facing +Z; emitter overhead but tilted so
        // only the reflected ray can see it. One bounce off the mirror must
        // pick up the emission.
        let emission = Color::new(10.0, 10.0, 6.0);
        let mut scene = Scene::new();
        push_triangle(
            &mut scene,
            floor_positions(),
            DVec3::Z,
            Color::ONE,
            Color::ZERO,
            Bsdf::Mirror,
        );
        // Emitter spanning the +Z axis above the camera, facing -Z. Winding
        // chosen so upward rays pass the one-sided determinant test.
        push_triangle(
            &mut scene,
            [
                DVec3::new(-5.0, -5.0, 3.0),
                DVec3::new(0.0, 5.0, 3.0),
                DVec3::new(5.0, -5.0, 3.0),
            ],
            -DVec3::Z,
            Color::ONE,
            emission,
            Bsdf::Diffuse,
        );

        let mut sampler = Sampler::new(17);
        // Straight down; the perfect reflection goes straight back up.
        let ray = Ray::new(DVec3::new(0.0, 0.0, 1.0), DVec3::new(0.0, 0.0, -1.0));
        let li = PathIntegrator::new(2).li(&scene, ray, &mut sampler);
        assert!(li.x > 0.0 && li.y > 0.0 && li.z > 0.0);
    }
}
