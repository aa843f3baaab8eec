use clap::Parser;
use log::{error, info};
use std::path::{Path, PathBuf};

mod cli;
mod logger;

use cli::Args;
use logger::init_logger;
use lumapath::camera::Camera;
use lumapath::config::{self, vec3_from};
use lumapath::mesh;
use lumapath::output::{save_image_as_bmp, save_image_as_exr, save_image_as_png};
use lumapath::renderer::Renderer;
use lumapath::scene::Scene;

fn main() {
    let args = Args::parse();

    init_logger(args.debug_level.into());

    info!("Lumapath {}", env!("CARGO_PKG_VERSION"));

    // Scene description is the one input nothing can proceed without
    let scene_config = match config::load(&args.scene) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load scene description {}: {}", args.scene.display(), e);
            std::process::exit(1);
        }
    };

    // Build the scene; a missing mesh is skipped, the render proceeds with
    // whatever loaded
    let mut scene = Scene::new();
    for mesh_config in &scene_config.meshes {
        let path = Path::new(&mesh_config.path);
        match mesh::load_obj(
            &mut scene,
            path,
            vec3_from(mesh_config.color),
            vec3_from(mesh_config.emission),
            mesh_config.material.into(),
        ) {
            Ok(count) => info!("Loaded {}: {} triangles", mesh_config.path, count),
            Err(e) => error!("Could not read mesh file {}: {} (skipping)", mesh_config.path, e),
        }
    }
    info!(
        "Scene ready: {} triangles ({} emissive)",
        scene.triangles.len(),
        scene.lights.len()
    );

    let mut camera = Camera::new(args.width, args.height);
    camera.origin = vec3_from(scene_config.camera.origin);
    camera.viewport_width = scene_config.camera.viewport_width;
    camera.viewport_height = scene_config.camera.viewport_height;

    let renderer = Renderer {
        samples_per_pixel: args.samples_per_pixel,
        max_depth: args.max_depth,
        seed: args.seed,
        threads: args.threads,
        snapshot_interval: args.snapshot_interval,
        snapshot_path: Some(snapshot_path(&args.output)),
    };
    info!("Image resolution: {}x{}, samples per pixel: {}", args.width, args.height, args.samples_per_pixel);

    let image = renderer.render(&scene, &camera);

    // Save image based on file extension; a failed final write is the only
    // terminal render failure
    let output = Path::new(&args.output);
    if args.output.ends_with(".exr") {
        if let Err(e) = save_image_as_exr(&image, args.width, args.height, output) {
            error!("Failed to save EXR image {}: {}", args.output, e);
            std::process::exit(1);
        }
    } else if args.output.ends_with(".png") {
        if let Err(e) = save_image_as_png(&image, args.width, args.height, output) {
            error!("Failed to save PNG image {}: {}", args.output, e);
            std::process::exit(1);
        }
    } else if args.output.ends_with(".bmp") {
        if let Err(e) = save_image_as_bmp(&image, args.width, args.height, output) {
            error!("Failed to save image {}: {}", args.output, e);
            std::process::exit(1);
        }
    } else {
        error!(
            "Unsupported file extension '{}'. Only .bmp, .png and .exr formats are supported.",
            Path::new(&args.output).extension().unwrap_or_default().to_string_lossy()
        );
        std::process::exit(1);
    }
}

/// Intermediate snapshots always use the native BMP format, alongside the
/// final output
fn snapshot_path(output: &str) -> PathBuf {
    PathBuf::from(output).with_extension("bmp")
}
