//! Application-level errors.

use std::path::PathBuf;

use selene_config::ConfigError;
use selene_log::TryInitError;
use selene_render::{RenderContextError, SurfaceError};

use crate::platform::PlatformError;

/// Everything that can stop the viewer before or while it runs.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to install logger: {0}")]
    Logging(#[from] TryInitError),

    /// The configured texture could not be opened or decoded.
    #[error("failed to load texture {}: {source}", path.display())]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("GPU initialization failed: {0}")]
    Gpu(#[from] RenderContextError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to spawn render thread: {0}")]
    RenderThread(#[from] std::io::Error),

    #[error(transparent)]
    Render(#[from] SurfaceError),
}
