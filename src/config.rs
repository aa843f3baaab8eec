//! Scene description loading.
//!
//! A scene is described by a TOML file: an optional `[camera]` table and a
//! `[[meshes]]` array where each entry names an OBJ file together with the
//! base color, emission, and material applied to every triangle it produces.
//!
//! ```toml
//! [camera]
//! origin = [0.0, 0.0, 1.0]
//!
//! [[meshes]]
//! path = "leftwall.obj"
//! color = [1.0, 0.0, 0.0]
//!
//! [[meshes]]
//! path = "smalllight.obj"
//! color = [1.0, 1.0, 0.6]
//! emission = [300.0, 300.0, 180.0]
//!
//! [[meshes]]
//! path = "widebox.obj"
//! material = { kind = "mirror" }
//! ```

use std::error::Error;
use std::fs;
use std::path::Path;

use glam::DVec3;
use serde::Deserialize;

use crate::bsdf::Bsdf;

/// Top-level scene description.
#[derive(Debug, Deserialize)]
pub struct SceneConfig {
    /// Camera placement; defaults match the classic box setup.
    #[serde(default)]
    pub camera: CameraConfig,
    /// Meshes to load, in order. An empty list renders an empty scene.
    #[serde(default)]
    pub meshes: Vec<MeshConfig>,
}

/// Camera placement and viewport extent.
#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    /// Camera position in world space.
    #[serde(default = "default_camera_origin")]
    pub origin: [f64; 3],
    /// Viewport width in world units.
    #[serde(default = "default_viewport_extent")]
    pub viewport_width: f64,
    /// Viewport height in world units.
    #[serde(default = "default_viewport_extent")]
    pub viewport_height: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            origin: default_camera_origin(),
            viewport_width: default_viewport_extent(),
            viewport_height: default_viewport_extent(),
        }
    }
}

/// One mesh entry: a file plus the attributes stamped onto its triangles.
#[derive(Debug, Deserialize)]
pub struct MeshConfig {
    /// Path to the OBJ file, relative to the working directory.
    pub path: String,
    /// Base color copied to every vertex.
    #[serde(default = "default_color")]
    pub color: [f64; 3],
    /// Emitted radiance; any nonzero value makes the mesh a light source.
    #[serde(default)]
    pub emission: [f64; 3],
    /// Reflectance model for the whole mesh.
    #[serde(default)]
    pub material: MaterialConfig,
}

/// Material selector as it appears in the scene file.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MaterialConfig {
    /// Lambertian diffuse (the default).
    #[default]
    Diffuse,
    /// Perfect mirror.
    Mirror,
    /// Phong lobe with the given exponent.
    Phong {
        /// Phong exponent; must be nonnegative.
        exponent: i32,
    },
}

impl From<MaterialConfig> for Bsdf {
    fn from(config: MaterialConfig) -> Self {
        match config {
            MaterialConfig::Diffuse => Bsdf::Diffuse,
            MaterialConfig::Mirror => Bsdf::Mirror,
            MaterialConfig::Phong { exponent } => Bsdf::Phong { exponent },
        }
    }
}

const fn default_camera_origin() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

const fn default_viewport_extent() -> f64 {
    1.0
}

const fn default_color() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

/// Convert a config triple into a vector.
pub fn vec3_from(value: [f64; 3]) -> DVec3 {
    DVec3::new(value[0], value[1], value[2])
}

/// Read and validate a scene description file.
pub fn load(path: &Path) -> Result<SceneConfig, Box<dyn Error>> {
    let raw = fs::read_to_string(path)?;
    let config: SceneConfig = toml::from_str(&raw)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &SceneConfig) -> Result<(), Box<dyn Error>> {
    let camera = &config.camera;
    if !camera.origin.iter().all(|v| v.is_finite()) {
        return Err("camera origin must contain finite values".into());
    }
    if !(camera.viewport_width > 0.0 && camera.viewport_width.is_finite()) {
        return Err("viewport_width must be positive and finite".into());
    }
    if !(camera.viewport_height > 0.0 && camera.viewport_height.is_finite()) {
        return Err("viewport_height must be positive and finite".into());
    }

    for mesh in &config.meshes {
        if mesh.path.trim().is_empty() {
            return Err("mesh path must be a non-empty file name".into());
        }
        if !mesh.color.iter().all(|v| v.is_finite() && *v >= 0.0) {
            return Err(format!("mesh {}: color must be nonnegative", mesh.path).into());
        }
        if !mesh.emission.iter().all(|v| v.is_finite() && *v >= 0.0) {
            return Err(format!("mesh {}: emission must be nonnegative", mesh.path).into());
        }
        if let MaterialConfig::Phong { exponent } = mesh.material {
            if exponent < 0 {
                return Err(format!("mesh {}: phong exponent must be nonnegative", mesh.path).into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_scene() {
        let raw = r#"
[camera]
origin = [0.0, 0.5, 2.0]
viewport_width = 2.0

[[meshes]]
path = "walls.obj"
color = [1.0, 0.0, 0.0]

[[meshes]]
path = "light.obj"
emission = [300.0, 300.0, 180.0]

[[meshes]]
path = "box.obj"
material = { kind = "phong", exponent = 20 }
"#;
        let config: SceneConfig = toml::from_str(raw).unwrap();
        validate(&config).unwrap();

        assert_eq!(config.camera.origin, [0.0, 0.5, 2.0]);
        assert_eq!(config.camera.viewport_width, 2.0);
        assert_eq!(config.camera.viewport_height, 1.0);
        assert_eq!(config.meshes.len(), 3);
        assert_eq!(config.meshes[0].color, [1.0, 0.0, 0.0]);
        assert_eq!(config.meshes[1].emission, [300.0, 300.0, 180.0]);
        assert!(matches!(
            Bsdf::from(config.meshes[2].material),
            Bsdf::Phong { exponent: 20 }
        ));
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let config: SceneConfig = toml::from_str("[[meshes]]\npath = \"a.obj\"\n").unwrap();
        validate(&config).unwrap();
        let mesh = &config.meshes[0];
        assert_eq!(mesh.color, [1.0, 1.0, 1.0]);
        assert_eq!(mesh.emission, [0.0, 0.0, 0.0]);
        assert!(matches!(Bsdf::from(mesh.material), Bsdf::Diffuse));
        assert_eq!(config.camera.origin, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn empty_scene_is_allowed() {
        let config: SceneConfig = toml::from_str("").unwrap();
        validate(&config).unwrap();
        assert!(config.meshes.is_empty());
    }

    #[test]
    fn rejects_negative_emission() {
        let raw = "[[meshes]]\npath = \"a.obj\"\nemission = [-1.0, 0.0, 0.0]\n";
        let config: SceneConfig = toml::from_str(raw).unwrap();
        assert!(validate(&config).is_err());
    }
}
