//! Image output.
//!
//! The pixel buffer produced by the renderer is linear RGB, row-major with
//! row 0 at the bottom. Three on-disk formats are supported, dispatched by
//! output-file extension:
//!
//! - BMP: 24-bit uncompressed, bottom-up rows padded to a 4-byte stride,
//!   ⟨B, G, R⟩ byte order, no tone mapping beyond clamping. This is the
//!   native snapshot format: the buffer's bottom-up row order matches the
//!   file's, so rows stream straight out.
//! - PNG: 8-bit with the sRGB transfer curve applied.
//! - EXR: 32-bit float linear HDR, for post-processing workflows.

use std::fs;
use std::io;
use std::path::Path;

use exr::prelude::write_rgb_file;
use glam::DVec3;
use image::{ImageBuffer, Rgb};
use log::info;

const FILE_HEADER_SIZE: u32 = 14;
const INFO_HEADER_SIZE: u32 = 40;

/// Quantize a linear channel to a byte: round(clamp(c, 0, 1) * 255).
fn quantize(channel: f64) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Bytes per BMP row: three per pixel, padded up to a multiple of four.
fn bmp_row_size(width: u32) -> usize {
    ((3 * width + 3) & !3) as usize
}

/// Save the pixel buffer as a 24-bit uncompressed BMP.
///
/// The whole file is assembled in memory and written in one shot, so a
/// failed write can truncate the file but never interleave with another.
pub fn save_image_as_bmp(
    pixels: &[DVec3],
    width: u32,
    height: u32,
    path: &Path,
) -> io::Result<()> {
    let row_size = bmp_row_size(width);
    let image_size = row_size * height as usize;
    let header_size = FILE_HEADER_SIZE + INFO_HEADER_SIZE;

    let mut data = Vec::with_capacity(header_size as usize + image_size);

    // BITMAPFILEHEADER, little-endian.
    data.extend_from_slice(b"BM");
    data.extend_from_slice(&(header_size + image_size as u32).to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes()); // reserved
    data.extend_from_slice(&0u16.to_le_bytes()); // reserved
    data.extend_from_slice(&header_size.to_le_bytes()); // pixel data offset

    // BITMAPINFOHEADER.
    data.extend_from_slice(&INFO_HEADER_SIZE.to_le_bytes());
    data.extend_from_slice(&(width as i32).to_le_bytes());
    data.extend_from_slice(&(height as i32).to_le_bytes()); // positive: bottom-up
    data.extend_from_slice(&1u16.to_le_bytes()); // planes
    data.extend_from_slice(&24u16.to_le_bytes()); // bits per pixel
    data.extend_from_slice(&0u32.to_le_bytes()); // BI_RGB, uncompressed
    data.extend_from_slice(&(image_size as u32).to_le_bytes());
    data.extend_from_slice(&0i32.to_le_bytes()); // x pixels per meter
    data.extend_from_slice(&0i32.to_le_bytes()); // y pixels per meter
    data.extend_from_slice(&0u32.to_le_bytes()); // colors used
    data.extend_from_slice(&0u32.to_le_bytes()); // important colors

    for y in 0..height {
        let row_start = data.len();
        for x in 0..width {
            let c = pixels[(y * width + x) as usize];
            data.push(quantize(c.z));
            data.push(quantize(c.y));
            data.push(quantize(c.x));
        }
        data.resize(row_start + row_size, 0);
    }

    fs::write(path, &data)?;
    info!("Image saved as {}", path.display());
    Ok(())
}

/// Save the pixel buffer as an 8-bit PNG with sRGB gamma correction.
pub fn save_image_as_png(
    pixels: &[DVec3],
    width: u32,
    height: u32,
    path: &Path,
) -> image::ImageResult<()> {
    // sRGB transfer with the linear toe for very dark values.
    let linear_to_gamma = |linear: f64| -> f64 {
        if linear <= 0.0 {
            0.0
        } else if linear <= 0.0031308 {
            12.92 * linear
        } else {
            1.055 * linear.powf(1.0 / 2.4) - 0.055
        }
    };

    let u8_image: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        // PNG rows run top-down; the buffer's run bottom-up.
        let c = pixels[((height - 1 - y) * width + x) as usize];
        Rgb([
            quantize(linear_to_gamma(c.x.clamp(0.0, 1.0))),
            quantize(linear_to_gamma(c.y.clamp(0.0, 1.0))),
            quantize(linear_to_gamma(c.z.clamp(0.0, 1.0))),
        ])
    });

    u8_image.save(path)?;
    info!("Image saved as {}", path.display());
    Ok(())
}

/// Save the pixel buffer as a linear-light EXR with full HDR range.
pub fn save_image_as_exr(
    pixels: &[DVec3],
    width: u32,
    height: u32,
    path: &Path,
) -> Result<(), exr::error::Error> {
    write_rgb_file(path, width as usize, height as usize, |x, y| {
        let c = pixels[(height as usize - 1 - y) * width as usize + x];
        (c.x as f32, c.y as f32, c.z as f32)
    })?;
    info!("HDR image saved as EXR: {}", path.display());
    Ok(())
}
