//! Reflectance models for path tracing.
//!
//! Implements three BSDF variants: Lambertian diffuse, perfect mirror, and a
//! Phong lobe. All evaluation happens in the local shading frame where the
//! surface normal is +Z (see [`crate::frame`]); a direction with z <= 0 is
//! below the surface.
//!
//! Conventions the integrator relies on:
//! - `wi` points toward the viewer (the previous path segment's origin),
//!   `wo` toward the next segment.
//! - `sample_f` returns the BSDF value without the surface cosine; the
//!   integrator multiplies by |wo.z| itself. The Phong lobe folds the cosine
//!   into `f` anyway, so Phong paths carry an extra cosine weighting. The
//!   mirror reports pdf = 1 and f = baseColor for its deterministic
//!   reflection instead of a delta distribution.

use glam::DVec3;
use std::f64::consts::PI;

use crate::sampler::Sampler;

/// Linear RGB color carried in a [`DVec3`].
pub type Color = DVec3;

/// Result of importance-sampling a BSDF.
#[derive(Debug, Clone, Copy)]
pub struct BsdfSample {
    /// Sampled outgoing direction in the local shading frame.
    pub wo: DVec3,
    /// Solid-angle probability density of `wo`.
    pub pdf: f64,
    /// BSDF value for the (wi, wo) pair.
    pub f: Color,
}

/// Surface reflectance model.
///
/// A tagged variant rather than a trait object: the three kinds share no
/// state and the integrator only ever calls `{f, sample_f, pdf}`, so enum
/// dispatch keeps the hot path free of vtables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bsdf {
    /// Lambertian diffuse lobe, f = baseColor / pi.
    Diffuse,
    /// Perfect specular mirror.
    Mirror,
    /// Phong lobe around the mirror direction.
    Phong {
        /// Phong exponent; higher is tighter.
        exponent: i32,
    },
}

/// Mirror reflection of `wi` about the local +Z axis.
fn reflect(wi: DVec3) -> DVec3 {
    2.0 * wi.z * DVec3::Z - wi
}

impl Bsdf {
    /// Evaluate the BSDF for a fixed direction pair.
    pub fn f(&self, wi: DVec3, wo: DVec3, base_color: Color) -> Color {
        match self {
            Bsdf::Diffuse => base_color / PI,
            Bsdf::Mirror => base_color,
            Bsdf::Phong { exponent } => {
                if wi.z <= 0.0 || wo.z <= 0.0 {
                    return Color::ZERO;
                }
                let wr = reflect(wi);
                let cos_alpha = wo.dot(wr).max(0.0);
                let norm = (exponent + 2) as f64 / (2.0 * PI);
                // Folds the surface cosine into f, unlike the diffuse lobe.
                base_color * norm * cos_alpha.powi(*exponent) * wo.z
            }
        }
    }

    /// Importance-sample an outgoing direction for `wi`.
    pub fn sample_f(&self, wi: DVec3, base_color: Color, sampler: &mut Sampler) -> BsdfSample {
        match self {
            Bsdf::Diffuse => {
                let (u1, u2) = sampler.get_2d();
                // Cosine-weighted hemisphere: theta = acos(sqrt(u1)).
                let theta = u1.sqrt().acos();
                let phi = 2.0 * PI * u2;
                let wo = DVec3::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                );
                BsdfSample {
                    wo,
                    pdf: self.pdf(wi, wo),
                    f: self.f(wi, wo, base_color),
                }
            }
            Bsdf::Mirror => {
                let wo = reflect(wi);
                BsdfSample {
                    wo,
                    pdf: self.pdf(wi, wo),
                    f: self.f(wi, wo, base_color),
                }
            }
            Bsdf::Phong { exponent } => {
                let wr = reflect(wi);
                let (u1, u2) = sampler.get_2d();
                let theta = u1.powf(1.0 / (exponent + 2) as f64).acos();
                let phi = 2.0 * PI * u2;
                let x = theta.sin() * phi.cos();
                let y = theta.sin() * phi.sin();
                let z = theta.cos();

                // Local basis around the reflection direction.
                let t = if wr.z.abs() < 0.999 {
                    DVec3::Z.cross(wr).normalize()
                } else {
                    DVec3::X
                };
                let b = wr.cross(t);
                let wo = (t * x + b * y + wr * z).normalize();

                BsdfSample {
                    wo,
                    pdf: self.pdf(wi, wo),
                    f: self.f(wi, wo, base_color),
                }
            }
        }
    }

    /// Solid-angle density that [`Bsdf::sample_f`] assigns to `wo` given `wi`.
    pub fn pdf(&self, wi: DVec3, wo: DVec3) -> f64 {
        match self {
            Bsdf::Diffuse => {
                if wo.z <= 0.0 {
                    0.0
                } else {
                    wo.z / PI
                }
            }
            Bsdf::Mirror => 1.0,
            Bsdf::Phong { exponent } => {
                if wi.z <= 0.0 || wo.z <= 0.0 {
                    return 0.0;
                }
                let wr = reflect(wi).normalize();
                let norm = (exponent + 2) as f64 / (2.0 * PI);
                norm * wo.dot(wr).max(0.0).powi(*exponent)
            }
        }
    }
}
