//! Pixel-parallel render driver.
//!
//! Pixels are dispatched over a rayon work-stealing pool as a flat index
//! space; path length varies sharply near lights, so dynamic stealing keeps
//! the workers balanced. Each worker owns an independent sampler seeded from
//! the render entropy XOR the pixel index, which makes renders reproducible
//! for a fixed seed regardless of scheduling.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use glam::DVec3;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rand::Rng;
use rayon::prelude::*;

use crate::camera::Camera;
use crate::integrator::PathIntegrator;
use crate::output;
use crate::sampler::Sampler;
use crate::scene::Scene;

/// Accumulated pixel radiance, written once per pixel.
///
/// Channels are stored as f64 bit patterns in relaxed atomics: every cell is
/// written by exactly one worker, and concurrent snapshot reads may observe
/// torn pixels, which intermediate snapshots tolerate.
pub struct Film {
    width: u32,
    height: u32,
    channels: Vec<AtomicU64>,
}

impl Film {
    /// Create a film with all pixels at zero.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * 3;
        let mut channels = Vec::with_capacity(len);
        channels.resize_with(len, || AtomicU64::new(0f64.to_bits()));
        Self {
            width,
            height,
            channels,
        }
    }

    /// Store the final radiance for pixel (i, j). Row 0 is the bottom row.
    pub fn set(&self, i: u32, j: u32, color: DVec3) {
        let base = (j as usize * self.width as usize + i as usize) * 3;
        self.channels[base].store(color.x.to_bits(), Ordering::Relaxed);
        self.channels[base + 1].store(color.y.to_bits(), Ordering::Relaxed);
        self.channels[base + 2].store(color.z.to_bits(), Ordering::Relaxed);
    }

    /// Copy the current pixel values out as a row-major buffer.
    pub fn snapshot(&self) -> Vec<DVec3> {
        self.channels
            .chunks_exact(3)
            .map(|c| {
                DVec3::new(
                    f64::from_bits(c[0].load(Ordering::Relaxed)),
                    f64::from_bits(c[1].load(Ordering::Relaxed)),
                    f64::from_bits(c[2].load(Ordering::Relaxed)),
                )
            })
            .collect()
    }
}

/// Render configuration and driver.
pub struct Renderer {
    /// Number of samples accumulated per pixel.
    pub samples_per_pixel: u32,
    /// Maximum path depth handed to the integrator.
    pub max_depth: u32,
    /// Render entropy; `None` draws a fresh seed per render.
    pub seed: Option<u64>,
    /// Worker count override; `None` uses ~90% of the hardware threads.
    pub threads: Option<usize>,
    /// Completed-pixel interval between intermediate snapshots.
    pub snapshot_interval: usize,
    /// Destination for intermediate snapshots; `None` disables them.
    pub snapshot_path: Option<PathBuf>,
}

impl Renderer {
    /// Render the scene and return the linear-RGB pixel buffer, row-major
    /// with row 0 at the bottom.
    pub fn render(&self, scene: &Scene, camera: &Camera) -> Vec<DVec3> {
        let width = camera.image_width;
        let height = camera.image_height;
        let total = width as usize * height as usize;
        let film = Film::new(width, height);
        let integrator = PathIntegrator::new(self.max_depth);
        let entropy = self.seed.unwrap_or_else(|| rand::rng().random());
        let threads = self.threads.unwrap_or_else(default_thread_count);

        info!(
            "Rendering {}x{} at {} spp, max depth {}, {} threads",
            width, height, self.samples_per_pixel, self.max_depth, threads
        );
        let start = std::time::Instant::now();
        let pb = ProgressBar::new(total as u64);
        pb.set_style(ProgressStyle::default_bar().template("{bar:40} {pos}/{len} ETA: {eta}").unwrap());

        let completed = AtomicUsize::new(0);
        let snapshot_gate = Mutex::new(());
        let sample_scale = 1.0 / self.samples_per_pixel.max(1) as f64;

        let render_pixels = || {
            (0..total).into_par_iter().for_each(|index| {
                let i = (index % width as usize) as u32;
                let j = (index / width as usize) as u32;
                let mut sampler = Sampler::new(entropy ^ index as u64);

                let mut accumulated = DVec3::ZERO;
                for _ in 0..self.samples_per_pixel {
                    let (du, dv) = sampler.get_2d();
                    let ray = camera.primary_ray(i, j, du, dv);
                    accumulated += integrator.li(scene, ray, &mut sampler);
                }
                film.set(i, j, accumulated * sample_scale);
                pb.inc(1);

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if self.snapshot_interval > 0 && done % self.snapshot_interval == 0 && done < total {
                    self.write_snapshot(&film, &snapshot_gate);
                }
            });
        };

        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(render_pixels),
            Err(e) => {
                warn!("Failed to build {threads}-thread pool, using the global pool: {e}");
                render_pixels();
            }
        }

        pb.finish();
        info!("Image generated in {:.2?}", start.elapsed());
        film.snapshot()
    }

    /// Write an intermediate snapshot if no other worker is already writing.
    ///
    /// Losing the race just skips this snapshot; the winner's is recent
    /// enough.
    fn write_snapshot(&self, film: &Film, gate: &Mutex<()>) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        if let Ok(_guard) = gate.try_lock() {
            if let Err(e) = output::save_image_as_bmp(&film.snapshot(), film.width, film.height, path)
            {
                warn!("Failed to write snapshot {}: {}", path.display(), e);
            }
        }
    }
}

/// Default worker count: ~90% of the available hardware threads, at least 1.
fn default_thread_count() -> usize {
    let available = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);
    ((available as f64 * 0.9) as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn film_cells_start_at_zero_and_hold_writes() {
        let film = Film::new(2, 2);
        assert!(film.snapshot().iter().all(|&p| p == DVec3::ZERO));

        film.set(1, 0, DVec3::new(0.25, 0.5, 0.75));
        let pixels = film.snapshot();
        assert_eq!(pixels[1], DVec3::new(0.25, 0.5, 0.75));
        assert_eq!(pixels[0], DVec3::ZERO);
        assert_eq!(pixels[2], DVec3::ZERO);
        assert_eq!(pixels[3], DVec3::ZERO);
    }

    #[test]
    fn default_thread_count_is_positive() {
        assert!(default_thread_count() >= 1);
    }

    #[test]
    fn empty_scene_renders_to_zero() {
        let scene = Scene::new();
        let camera = Camera::new(4, 4);
        let renderer = Renderer {
            samples_per_pixel: 2,
            max_depth: 6,
            seed: Some(0),
            threads: Some(1),
            snapshot_interval: 1_000_000,
            snapshot_path: None,
        };
        let pixels = renderer.render(&scene, &camera);
        assert_eq!(pixels.len(), 16);
        assert!(pixels.iter().all(|&p| p == DVec3::ZERO));
    }
}
