//! The Selene viewer: a window, phase input, and the sphere render thread.

pub mod error;
pub mod headless;
pub mod input;
pub mod platform;
pub mod texture_source;
pub mod window;

pub use error::AppError;
