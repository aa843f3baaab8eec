//! OBJ-subset mesh ingestion.
//!
//! Reads `v`, `vn`, and `f` records and appends the resulting triangles to a
//! scene, with the caller supplying the per-mesh base color, emission, and
//! material. Parsing is deliberately lenient toward real-world exporters:
//! records that fail to parse are skipped and the surrounding valid records
//! are still ingested.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use glam::DVec3;
use log::debug;

use crate::bsdf::{Bsdf, Color};
use crate::scene::Scene;
use crate::triangle::{Triangle, Vertex};

/// Load an OBJ file into the scene.
///
/// Returns the number of triangles appended. Fails only when the file cannot
/// be opened; the caller decides whether a missing mesh is fatal.
pub fn load_obj(
    scene: &mut Scene,
    path: &Path,
    color: Color,
    emission: Color,
    material: Bsdf,
) -> io::Result<usize> {
    let file = File::open(path)?;
    Ok(read_obj(BufReader::new(file), scene, color, emission, material))
}

/// Parse OBJ records from a reader, appending triangles to the scene.
///
/// Faces are fan-split at their first vertex: a triangle emits one triangle,
/// a quad two, an n-gon n-2. Every face vertex is materialized as a fresh
/// scene vertex carrying the mesh's base color. Triangles with nonzero
/// emission join the emissive subset automatically.
pub fn read_obj<R: BufRead>(
    reader: R,
    scene: &mut Scene,
    color: Color,
    emission: Color,
    material: Bsdf,
) -> usize {
    let mut positions: Vec<DVec3> = Vec::new();
    let mut normals: Vec<DVec3> = Vec::new();
    let mut added = 0;

    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                if let Some(p) = parse_vec3(&mut tokens) {
                    positions.push(p);
                } else {
                    debug!("skipping malformed position record: {line}");
                }
            }
            Some("vn") => {
                if let Some(n) = parse_vec3(&mut tokens) {
                    normals.push(n);
                } else {
                    debug!("skipping malformed normal record: {line}");
                }
            }
            // Texture coordinates are recognized but unused.
            Some("vt") => {}
            Some("f") => {
                added += read_face(tokens, &positions, &normals, scene, color, emission, material);
            }
            _ => {}
        }
    }

    added
}

fn parse_vec3<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<DVec3> {
    let x = tokens.next()?.parse().ok()?;
    let y = tokens.next()?.parse().ok()?;
    let z = tokens.next()?.parse().ok()?;
    Some(DVec3::new(x, y, z))
}

/// Materialize one face record; returns the number of triangles appended.
///
/// Any unresolvable corner (bad index, missing normal stream) makes the
/// whole face malformed and it is skipped.
fn read_face<'a>(
    tokens: impl Iterator<Item = &'a str>,
    positions: &[DVec3],
    normals: &[DVec3],
    scene: &mut Scene,
    color: Color,
    emission: Color,
    material: Bsdf,
) -> usize {
    let mut corners: Vec<Vertex> = Vec::new();
    for token in tokens {
        let Some((position, normal)) = resolve_corner(token, positions, normals) else {
            debug!("skipping face with unresolvable vertex token: {token}");
            return 0;
        };
        corners.push(Vertex {
            position,
            color,
            normal,
        });
    }
    if corners.len() < 3 {
        return 0;
    }

    let base = scene.vertices.len() as u32;
    let n = corners.len();
    scene.vertices.extend(corners);

    // Fan split anchored at the first face vertex.
    for k in 1..(n - 1) as u32 {
        scene.push_triangle(Triangle {
            vertices: [base, base + k, base + k + 1],
            emission,
            material,
        });
    }
    n - 2
}

/// Resolve a `pos[/tex[/normal]]` token against the position/normal streams.
///
/// Indices are 1-based; the texture sub-field may be empty or absent and is
/// ignored either way.
fn resolve_corner(token: &str, positions: &[DVec3], normals: &[DVec3]) -> Option<(DVec3, DVec3)> {
    let mut fields = token.split('/');
    let position = *positions.get(index_field(fields.next()?)?)?;
    let _texture = fields.next();
    let normal = *normals.get(index_field(fields.next()?)?)?;
    Some((position, normal))
}

fn index_field(field: &str) -> Option<usize> {
    field.parse::<usize>().ok()?.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_into_scene(obj: &str, emission: Color) -> Scene {
        let mut scene = Scene::new();
        read_obj(
            Cursor::new(obj),
            &mut scene,
            Color::ONE,
            emission,
            Bsdf::Diffuse,
        );
        scene
    }

    const QUAD: &str = "\
# a unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1

f 1//1 2//1 3//1 4//1
";

    #[test]
    fn quad_splits_into_two_triangles() {
        let scene = read_into_scene(QUAD, Color::ZERO);
        assert_eq!(scene.triangles.len(), 2);
        assert_eq!(scene.vertices.len(), 4);
        // Fan split at the first vertex: (v1 v2 v3) and (v1 v3 v4).
        assert_eq!(scene.triangles[0].vertices, [0, 1, 2]);
        assert_eq!(scene.triangles[1].vertices, [0, 2, 3]);
    }

    #[test]
    fn ngon_fans_into_n_minus_two_triangles() {
        let obj = "\
v 0 0 0
v 1 0 0
v 2 1 0
v 1 2 0
v 0 2 0
vn 0 0 1
f 1//1 2//1 3//1 4//1 5//1
";
        let scene = read_into_scene(obj, Color::ZERO);
        assert_eq!(scene.triangles.len(), 3);
    }

    #[test]
    fn emissive_faces_join_the_light_subset() {
        let scene = read_into_scene(QUAD, Color::new(10.0, 10.0, 6.0));
        assert_eq!(scene.lights, vec![0, 1]);

        let dark = read_into_scene(QUAD, Color::ZERO);
        assert!(dark.lights.is_empty());
    }

    #[test]
    fn texture_indices_are_ignored() {
        let obj = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.5 0.5
vn 0 0 1
f 1/1/1 2/1/1 3/1/1
";
        let scene = read_into_scene(obj, Color::ZERO);
        assert_eq!(scene.triangles.len(), 1);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let obj = "\
v 0 0 0
v 1 0
v 1 0 0
v 0 1 0
vn 0 0 1
usemtl whatever
f 1//1 2//1 3//1
f 1//9 2//1 3//1
f 1 2 3
f 1//1 99//1 3//1
";
        let scene = read_into_scene(obj, Color::ZERO);
        // Short `v`, the out-of-range indices, and the normal-less face are
        // all dropped; the one valid face survives.
        assert_eq!(scene.triangles.len(), 1);
        assert_eq!(scene.vertices.len(), 3);
    }

    #[test]
    fn vertices_carry_mesh_attributes() {
        let mut scene = Scene::new();
        read_obj(
            Cursor::new(QUAD),
            &mut scene,
            Color::new(1.0, 0.0, 0.0),
            Color::ZERO,
            Bsdf::Mirror,
        );
        assert!(scene
            .vertices
            .iter()
            .all(|v| v.color == Color::new(1.0, 0.0, 0.0)));
        assert!(scene.vertices.iter().all(|v| v.normal == DVec3::Z));
        assert_eq!(scene.triangles[0].material, Bsdf::Mirror);
    }
}
