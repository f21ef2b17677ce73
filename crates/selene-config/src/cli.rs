//! Command-line argument parsing for the Selene viewer.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Selene command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "selene", about = "Phase-lit textured sphere viewer")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// PNG or JPEG texture wrapped around the sphere.
    #[arg(long)]
    pub texture: Option<PathBuf>,

    /// Subdivisions from pole to pole.
    #[arg(long)]
    pub latitude_bands: Option<u32>,

    /// Subdivisions around the equator.
    #[arg(long)]
    pub longitude_bands: Option<u32>,

    /// Initial phase in orbits (0.25 lights the side facing the camera).
    #[arg(long, allow_negative_numbers = true)]
    pub phase: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Render without a window, recording commands instead of drawing.
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many frames.
    #[arg(long)]
    pub frames: Option<u64>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(ref path) = args.texture {
            self.texture.path = Some(path.clone());
        }
        if let Some(bands) = args.latitude_bands {
            self.sphere.latitude_bands = bands;
        }
        if let Some(bands) = args.longitude_bands {
            self.sphere.longitude_bands = bands;
        }
        if let Some(phase) = args.phase {
            self.input.initial_phase = phase;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
