use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

/// Custom enum for log levels that can be used with clap's ValueEnum
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convert our custom LogLevel enum to log crate's LevelFilter
impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Command line arguments structure using clap derive macros
#[derive(Parser)]
#[command(name = "lumapath")]
#[command(about = "A triangle-mesh path tracer with multiple importance sampling")]
pub struct Args {
    /// Scene description file (TOML listing meshes with color/emission/material)
    pub scene: PathBuf,

    /// Set the logging level (defaults to "info")
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub debug_level: LogLevel,

    /// Image width in pixels
    #[arg(long, default_value = "800", help = "Image width in pixels")]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value = "800", help = "Image height in pixels")]
    pub height: u32,

    /// Number of samples per pixel
    #[arg(long, short = 's', default_value = "30", help = "Number of samples per pixel")]
    pub samples_per_pixel: u32,

    /// Maximum path depth (scattering events per path)
    #[arg(long, short = 'd', default_value = "6", help = "Maximum path depth")]
    pub max_depth: u32,

    /// Output file path (.bmp for the native format, .png for 8-bit with gamma correction, .exr for HDR linear)
    #[arg(short, long, default_value = "render.bmp", help = "Output file path (.bmp, .png or .exr)")]
    pub output: String,

    /// Render entropy seed; fixing it makes renders reproducible
    #[arg(long, help = "Render entropy seed; fixing it makes renders reproducible")]
    pub seed: Option<u64>,

    /// Number of worker threads (defaults to ~90% of hardware threads)
    #[arg(long, help = "Number of worker threads (defaults to ~90% of hardware threads)")]
    pub threads: Option<usize>,

    /// Completed pixels between intermediate snapshots (0 disables them)
    #[arg(long, default_value = "1000000", help = "Completed pixels between intermediate snapshots (0 disables them)")]
    pub snapshot_interval: usize,
}
