//! `--headless` runs: the full surface lifecycle without a window or GPU.
//!
//! The sphere is drawn into a [`HeadlessContext`] on the render thread while
//! the main thread sweeps the phase, which exercises the same concurrency as
//! the windowed viewer.

use std::time::Duration;

use selene_config::Config;
use selene_lighting::PhaseHandle;
use selene_render::{
    CommandLog, DecodedImage, HeadlessContext, RenderLoop, RenderStats, SphereSurface,
    SurfaceEvent,
};
use tracing::info;

use crate::error::AppError;
use crate::window::surface_settings;

/// Frames drawn when `--frames` is not given.
pub const DEFAULT_HEADLESS_FRAMES: u64 = 240;

/// Draw `frames` frames, advancing the phase by `input.phase_step` between
/// polls, and return the render thread's statistics.
pub fn run_headless(
    config: &Config,
    image: DecodedImage,
    frames: Option<u64>,
) -> Result<RenderStats, AppError> {
    let frames = frames.unwrap_or(DEFAULT_HEADLESS_FRAMES);
    let phase = PhaseHandle::new(config.input.initial_phase);
    let log = CommandLog::default();

    let surface = SphereSurface::new(
        HeadlessContext::with_log(log.clone()),
        surface_settings(config),
        image,
        phase.clone(),
    );
    let render_loop = RenderLoop::spawn(surface, Some(frames))?;
    render_loop.send(SurfaceEvent::Created {
        width: config.window.width,
        height: config.window.height,
    });

    let mut current = config.input.initial_phase;
    while !render_loop.is_finished() {
        current += config.input.phase_step;
        phase.set_phase(current);
        std::thread::sleep(Duration::from_millis(1));
    }

    let stats = render_loop.shutdown()?;
    info!(
        frames = stats.frames_drawn,
        draws_recorded = log.draw_count(),
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "Headless run complete"
    );
    Ok(stats)
}
