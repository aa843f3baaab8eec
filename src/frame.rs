//! Shading frame transforms.
//!
//! Builds an orthonormal basis around a surface normal and converts directions
//! between world space and the local tangent space where the normal is +Z.
//! The BSDF layer works entirely in this local frame: a direction with z > 0
//! is on the upper hemisphere, z <= 0 is at or below the surface.

use glam::DVec3;

/// Pick a tangent that is guaranteed not to be colinear with the normal.
fn tangent(normal: DVec3) -> DVec3 {
    if normal.x.abs() > normal.z.abs() {
        DVec3::new(-normal.y, normal.x, 0.0).normalize()
    } else {
        DVec3::new(0.0, -normal.z, normal.y).normalize()
    }
}

/// Transform a world-space direction into the local frame around `normal`.
///
/// `normal` is assumed to be unit length.
pub fn to_local(normal: DVec3, v: DVec3) -> DVec3 {
    let t = tangent(normal);
    let b = normal.cross(t);
    DVec3::new(v.dot(t), v.dot(b), v.dot(normal))
}

/// Transform a local-frame direction back into world space.
///
/// Exact inverse of [`to_local`] for the same (unit) normal.
pub fn to_world(normal: DVec3, v: DVec3) -> DVec3 {
    let t = tangent(normal);
    let b = normal.cross(t);
    v.x * t + v.y * b + v.z * normal
}
