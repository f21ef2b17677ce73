//! Dedicated render thread that owns a [`SphereSurface`].
//!
//! The host forwards lifecycle events over a channel. While the surface is
//! drawable the thread draws back to back and only polls for events; otherwise
//! it blocks until the next event arrives. Dropping the [`RenderLoop`] closes
//! the channel, which the thread treats as a destroy request.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, error, info, warn};

use crate::context::{GraphicsContext, RenderSettings};
use crate::surface::{SphereSurface, SurfaceError, SurfaceState};

/// Name of the spawned render thread.
pub const RENDER_THREAD_NAME: &str = "selene-render";

/// Lifecycle notifications from the windowing side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceEvent {
    Created { width: u32, height: u32 },
    Resized { width: u32, height: u32 },
    /// Clear color or depth test changed, e.g. after a config reload.
    RenderSettingsChanged(RenderSettings),
    Destroyed,
}

/// Summary returned when the render thread exits cleanly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderStats {
    pub frames_drawn: u64,
    pub elapsed: Duration,
}

impl RenderStats {
    pub fn frames_per_second(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.frames_drawn as f64 / seconds
        } else {
            0.0
        }
    }
}

/// Handle to the render thread.
pub struct RenderLoop {
    sender: Option<Sender<SurfaceEvent>>,
    handle: Option<JoinHandle<Result<RenderStats, SurfaceError>>>,
}

impl RenderLoop {
    /// Move `surface` onto a new render thread.
    ///
    /// With `max_frames` set, the thread destroys the surface and exits on
    /// its own after drawing that many frames.
    pub fn spawn<C>(surface: SphereSurface<C>, max_frames: Option<u64>) -> std::io::Result<Self>
    where
        C: GraphicsContext + Send + 'static,
    {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let handle = std::thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_owned())
            .spawn(move || run(surface, &receiver, max_frames))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue an event for the render thread. Returns `false` once the thread
    /// has exited.
    pub fn send(&self, event: SurfaceEvent) -> bool {
        match &self.sender {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Whether the render thread has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Close the event channel and wait for the thread to exit.
    pub fn shutdown(mut self) -> Result<RenderStats, SurfaceError> {
        self.sender.take();
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            },
            None => Ok(RenderStats {
                frames_drawn: 0,
                elapsed: Duration::ZERO,
            }),
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run<C: GraphicsContext>(
    mut surface: SphereSurface<C>,
    events: &Receiver<SurfaceEvent>,
    max_frames: Option<u64>,
) -> Result<RenderStats, SurfaceError> {
    let started = Instant::now();
    let mut frames_drawn = 0u64;
    debug!("Render thread started");

    loop {
        let drawable = matches!(
            surface.state(),
            SurfaceState::Ready | SurfaceState::Rendering
        );

        let event = if drawable {
            match events.try_recv() {
                Ok(event) => Some(event),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(SurfaceEvent::Destroyed),
            }
        } else {
            Some(events.recv().unwrap_or(SurfaceEvent::Destroyed))
        };

        match event {
            Some(SurfaceEvent::Created { width, height }) => {
                surface.on_surface_created(width, height)?;
            }
            Some(SurfaceEvent::Resized { width, height }) => {
                match surface.on_surface_resized(width, height) {
                    Ok(()) => {}
                    Err(SurfaceError::NotReady { state }) => {
                        debug!("Ignoring resize while {state}");
                    }
                    Err(err) => return Err(report(err)),
                }
            }
            Some(SurfaceEvent::RenderSettingsChanged(render)) => {
                if let Err(err) = surface.on_render_settings_changed(render) {
                    debug!("Ignoring render settings: {err}");
                }
            }
            Some(SurfaceEvent::Destroyed) => {
                surface.on_surface_destroyed();
                break;
            }
            None => {
                if max_frames.is_some_and(|max| frames_drawn >= max) {
                    surface.on_surface_destroyed();
                    break;
                }
                if let Err(err) = surface.on_draw_frame() {
                    return Err(report(err));
                }
                frames_drawn += 1;
            }
        }
    }

    let stats = RenderStats {
        frames_drawn,
        elapsed: started.elapsed(),
    };
    info!(
        "Render thread exiting: {} frames in {:.2?} ({:.1} fps)",
        stats.frames_drawn,
        stats.elapsed,
        stats.frames_per_second()
    );
    Ok(stats)
}

fn report(err: SurfaceError) -> SurfaceError {
    match &err {
        SurfaceError::RenderContextLost(_) => warn!("Render thread stopping: {err}"),
        _ => error!("Render thread stopping: {err}"),
    }
    err
}
